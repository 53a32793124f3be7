//! Record encoding and composite key layout.

use serde::de::DeserializeOwned;
use serde::Serialize;

use elector_types::{ElectionId, KeyType, NodeId};

use crate::LmdbError;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    bincode::serialize(value).map_err(|e| LmdbError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    bincode::deserialize(bytes).map_err(|e| LmdbError::Serialization(e.to_string()))
}

pub(crate) fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// `node_be || election_be`, the prefix shared by key and participation rows.
pub(crate) fn node_election_prefix(node: NodeId, election: ElectionId) -> [u8; 16] {
    let mut k = [0u8; 16];
    k[..8].copy_from_slice(&node.0.to_be_bytes());
    k[8..].copy_from_slice(&election.as_u64().to_be_bytes());
    k
}

/// `node_be || election_be || key_type_tag`
pub(crate) fn key_record_key(node: NodeId, election: ElectionId, key_type: KeyType) -> [u8; 17] {
    let mut k = [0u8; 17];
    k[..16].copy_from_slice(&node_election_prefix(node, election));
    k[16] = key_type.tag();
    k
}

/// `node_be || election_be || seq_be`
pub(crate) fn participation_key(node: NodeId, election: ElectionId, seq: u64) -> [u8; 24] {
    let mut k = [0u8; 24];
    k[..16].copy_from_slice(&node_election_prefix(node, election));
    k[16..].copy_from_slice(&seq.to_be_bytes());
    k
}

/// Smallest key greater than every key starting with `prefix`, or `None`
/// when the prefix is all `0xFF` and the scan runs to the end.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

pub(crate) fn read_u64(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization("expected 8-byte counter".to_string()))?;
    Ok(u64::from_le_bytes(arr))
}
