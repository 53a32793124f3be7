//! Ledger records: wallets, nodes, keys and participations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{AccountAddress, ElectionId, KeyHandle, KeyType, MaxFactor, Nanotons, Timestamp};

/// Ledger-assigned wallet identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletId(pub u64);

/// Ledger-assigned node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A funding wallet. The private key stays in `key_file`, which the
/// transaction composer reads when building transfers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub address: AccountAddress,
    /// Base path of the wallet key file (without the `.pk` suffix).
    pub key_file: PathBuf,
    /// Cached on-chain balance, refreshed by balance sync.
    pub balance: Nanotons,
    pub enabled: bool,
}

/// A validator node reachable through its control console.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub wallet_id: WalletId,
    /// `host:port` of the control console.
    pub host_port: String,
    /// Server public key file used to authenticate the node.
    pub server_pub: PathBuf,
    /// Client private key file used to authenticate to the node.
    pub client_cert: PathBuf,
    pub enabled: bool,
}

/// One key of a node for one election. At most one record exists per
/// `(node, election, key_type)`; records are never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub node_id: NodeId,
    pub election_id: ElectionId,
    pub key_type: KeyType,
    pub handle: KeyHandle,
}

/// Audit record of a stake bid handed to the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub node_id: NodeId,
    pub election_id: ElectionId,
    pub stake_amount: Nanotons,
    pub max_factor: MaxFactor,
    pub submitted_at: Timestamp,
}
