//! Nullable ledger: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use elector_store::{
    ElectionStore, EnabledFilter, KeyStore, NewNode, NodeStore, ParticipationStore, StoreError,
    WalletStore,
};
use elector_types::{
    AccountAddress, ElectionId, ElectionWindow, KeyRecord, KeyType, Nanotons, Node, NodeId,
    Participation, Wallet, WalletId,
};

type KeySlot = (NodeId, ElectionId, KeyType);

#[derive(Default)]
struct LedgerState {
    next_wallet: u64,
    next_node: u64,
    wallets: BTreeMap<WalletId, Wallet>,
    nodes: BTreeMap<NodeId, Node>,
    elections: BTreeMap<ElectionId, ElectionWindow>,
    keys: HashMap<KeySlot, KeyRecord>,
    registered: HashSet<KeySlot>,
    participations: Vec<Participation>,
}

/// An in-memory ledger implementing every store trait.
///
/// [`NullLedger::set_unavailable`] makes every subsequent call fail with a
/// backend error, standing in for a lost database.
#[derive(Default)]
pub struct NullLedger {
    state: Mutex<LedgerState>,
    unavailable: AtomicBool,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Backend("ledger unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    /// Every key record written so far, in no particular order.
    pub fn key_records(&self) -> Vec<KeyRecord> {
        self.state.lock().unwrap().keys.values().cloned().collect()
    }

    pub fn all_participations(&self) -> Vec<Participation> {
        self.state.lock().unwrap().participations.clone()
    }
}

impl WalletStore for NullLedger {
    fn add_wallet(&self, address: AccountAddress, key_file: PathBuf) -> Result<Wallet, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.next_wallet += 1;
        let wallet = Wallet {
            id: WalletId(state.next_wallet),
            address,
            key_file,
            balance: Nanotons::ZERO,
            enabled: true,
        };
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().wallets.get(&id).cloned())
    }

    fn list_wallets(&self, filter: EnabledFilter) -> Result<Vec<Wallet>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .wallets
            .values()
            .filter(|w| filter.matches(w.enabled))
            .cloned()
            .collect())
    }

    fn update_balance(&self, id: WalletId, balance: Nanotons) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let wallet = state
            .wallets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("wallet {id}")))?;
        wallet.balance = balance;
        Ok(())
    }

    fn set_wallet_enabled(&self, id: WalletId, enabled: bool) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let wallet = state
            .wallets
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("wallet {id}")))?;
        wallet.enabled = enabled;
        Ok(())
    }

    fn delete_wallet(&self, id: WalletId) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .wallets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("wallet {id}")))
    }
}

impl NodeStore for NullLedger {
    fn add_node(&self, node: NewNode) -> Result<Node, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if !state.wallets.contains_key(&node.wallet_id) {
            return Err(StoreError::NotFound(format!("wallet {}", node.wallet_id)));
        }
        state.next_node += 1;
        let node = Node {
            id: NodeId(state.next_node),
            wallet_id: node.wallet_id,
            host_port: node.host_port,
            server_pub: node.server_pub,
            client_cert: node.client_cert,
            enabled: true,
        };
        state.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().nodes.get(&id).cloned())
    }

    fn list_nodes(&self, wallet: WalletId, filter: EnabledFilter) -> Result<Vec<Node>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .nodes
            .values()
            .filter(|n| n.wallet_id == wallet && filter.matches(n.enabled))
            .cloned()
            .collect())
    }

    fn set_node_enabled(&self, id: NodeId, enabled: bool) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let node = state
            .nodes
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("node {id}")))?;
        node.enabled = enabled;
        Ok(())
    }

    fn delete_node(&self, id: NodeId) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .nodes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("node {id}")))
    }
}

impl ElectionStore for NullLedger {
    fn get_election(&self, id: ElectionId) -> Result<Option<ElectionWindow>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().elections.get(&id).copied())
    }

    fn add_election(&self, window: &ElectionWindow) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if state.elections.contains_key(&window.election_id) {
            return Err(StoreError::Duplicate(format!("election {}", window.election_id)));
        }
        state.elections.insert(window.election_id, *window);
        Ok(())
    }

    fn list_elections(&self) -> Result<Vec<ElectionWindow>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().elections.values().copied().collect())
    }
}

impl KeyStore for NullLedger {
    fn get_key(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<Option<KeyRecord>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .keys
            .get(&(node, election, key_type))
            .cloned())
    }

    fn add_key(&self, record: &KeyRecord) -> Result<(), StoreError> {
        self.check()?;
        let slot = (record.node_id, record.election_id, record.key_type);
        let mut state = self.state.lock().unwrap();
        if state.keys.contains_key(&slot) {
            return Err(StoreError::Duplicate(format!(
                "{} key of node {} for election {}",
                record.key_type, record.node_id, record.election_id
            )));
        }
        state.keys.insert(slot, record.clone());
        Ok(())
    }

    fn is_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .registered
            .contains(&(node, election, key_type)))
    }

    fn mark_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .registered
            .insert((node, election, key_type));
        Ok(())
    }
}

impl ParticipationStore for NullLedger {
    fn add_participation(&self, participation: &Participation) -> Result<(), StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .participations
            .push(participation.clone());
        Ok(())
    }

    fn participations(
        &self,
        node: NodeId,
        election: ElectionId,
    ) -> Result<Vec<Participation>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .participations
            .iter()
            .filter(|p| p.node_id == node && p.election_id == election)
            .cloned()
            .collect())
    }

    fn node_participations(&self, node: NodeId) -> Result<Vec<Participation>, StoreError> {
        self.check()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .participations
            .iter()
            .filter(|p| p.node_id == node)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elector_types::KeyHandle;

    #[test]
    fn keys_are_unique_per_slot() {
        let ledger = NullLedger::new();
        let record = KeyRecord {
            node_id: NodeId(1),
            election_id: ElectionId::new(10),
            key_type: KeyType::Adnl,
            handle: KeyHandle::new("A"),
        };
        ledger.add_key(&record).unwrap();
        assert!(matches!(ledger.add_key(&record), Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn unavailable_ledger_fails_everything() {
        let ledger = NullLedger::new();
        ledger.set_unavailable(true);
        assert!(ledger.list_wallets(EnabledFilter::All).is_err());
        ledger.set_unavailable(false);
        assert!(ledger.list_wallets(EnabledFilter::All).unwrap().is_empty());
    }
}
