//! LMDB implementation of NodeStore.

use elector_store::node::{NewNode, NodeStore};
use elector_store::{EnabledFilter, StoreError};
use elector_types::{Node, NodeId, WalletId};

use crate::codec::{decode, encode, id_key};
use crate::{LmdbError, LmdbStore};

const NODE_COUNTER: &str = "next_node_id";

impl NodeStore for LmdbStore {
    fn add_node(&self, new: NewNode) -> Result<Node, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let wallet_exists = self
            .wallets_db
            .get(&wtxn, &id_key(new.wallet_id.0))
            .map_err(LmdbError::from)?
            .is_some();
        if !wallet_exists {
            return Err(LmdbError::NotFound(format!("wallet {}", new.wallet_id)).into());
        }

        let id = NodeId(self.next_counter(&mut wtxn, NODE_COUNTER)?);
        let node = Node {
            id,
            wallet_id: new.wallet_id,
            host_port: new.host_port,
            server_pub: new.server_pub,
            client_cert: new.client_cert,
            enabled: true,
        };
        self.nodes_db
            .put(&mut wtxn, &id_key(id.0), &encode(&node)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(node)
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .nodes_db
            .get(&rtxn, &id_key(id.0))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn list_nodes(&self, wallet: WalletId, filter: EnabledFilter) -> Result<Vec<Node>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut nodes = Vec::new();
        for entry in self.nodes_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            let node: Node = decode(val)?;
            if node.wallet_id == wallet && filter.matches(node.enabled) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn set_node_enabled(&self, id: NodeId, enabled: bool) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut node: Node = match self
            .nodes_db
            .get(&wtxn, &id_key(id.0))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(bytes)?,
            None => return Err(LmdbError::NotFound(format!("node {}", id)).into()),
        };
        node.enabled = enabled;
        self.nodes_db
            .put(&mut wtxn, &id_key(id.0), &encode(&node)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let removed = self
            .nodes_db
            .delete(&mut wtxn, &id_key(id.0))
            .map_err(LmdbError::from)?;
        if !removed {
            return Err(LmdbError::NotFound(format!("node {}", id)).into());
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
