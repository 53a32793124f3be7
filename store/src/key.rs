//! Validator key storage trait.

use elector_types::{ElectionId, KeyRecord, KeyType, NodeId};

use crate::StoreError;

/// Keys are unique per `(node, election, key_type)`.
///
/// A key record alone does not prove the node accepted its registration,
/// so registration success is tracked separately and may lag behind the
/// record by one or more ticks.
pub trait KeyStore {
    fn get_key(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<Option<KeyRecord>, StoreError>;

    /// Persist a new key. Fails with `Duplicate` if one already exists for
    /// the same `(node, election, key_type)`.
    fn add_key(&self, record: &KeyRecord) -> Result<(), StoreError>;

    fn is_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<bool, StoreError>;

    fn mark_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<(), StoreError>;
}
