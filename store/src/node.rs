//! Node storage trait.

use std::path::PathBuf;

use elector_types::{Node, NodeId, WalletId};

use crate::{EnabledFilter, StoreError};

/// Fields supplied when registering a node; the id is ledger-assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewNode {
    pub wallet_id: WalletId,
    pub host_port: String,
    pub server_pub: PathBuf,
    pub client_cert: PathBuf,
}

pub trait NodeStore {
    /// Insert a new enabled node. The owning wallet must exist.
    fn add_node(&self, node: NewNode) -> Result<Node, StoreError>;

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StoreError>;

    /// Nodes of `wallet` matching `filter`, ordered by id.
    fn list_nodes(&self, wallet: WalletId, filter: EnabledFilter) -> Result<Vec<Node>, StoreError>;

    fn set_node_enabled(&self, id: NodeId, enabled: bool) -> Result<(), StoreError>;

    fn delete_node(&self, id: NodeId) -> Result<(), StoreError>;
}
