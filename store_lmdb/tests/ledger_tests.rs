//! Integration tests for the LMDB ledger: every store against a real
//! environment in a temporary directory.

use std::path::PathBuf;

use elector_store::{
    ElectionStore, EnabledFilter, KeyStore, MetaStore, NewNode, NodeStore, ParticipationStore,
    StoreError, WalletStore,
};
use elector_store_lmdb::{LmdbStore, CURRENT_SCHEMA_VERSION, DEFAULT_MAP_SIZE};
use elector_types::{
    AccountAddress, ElectionId, ElectionWindow, KeyHandle, KeyRecord, KeyType, MaxFactor,
    Nanotons, NodeId, Participation, Timestamp,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_store() -> (tempfile::TempDir, LmdbStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open store");
    (dir, store)
}

fn address(byte: u8) -> AccountAddress {
    AccountAddress::new(0, [byte; 32])
}

fn window(id: u64) -> ElectionWindow {
    ElectionWindow {
        election_id: ElectionId::new(id),
        start_at: id - 3600,
        close_at: id - 1800,
        next_elections_at: id + 3600,
    }
}

fn new_node(store: &LmdbStore, host: &str) -> elector_types::Node {
    let wallet = store
        .add_wallet(address(1), PathBuf::from("/keys/wallet"))
        .unwrap();
    store
        .add_node(NewNode {
            wallet_id: wallet.id,
            host_port: host.to_string(),
            server_pub: PathBuf::from("/keys/server.pub"),
            client_cert: PathBuf::from("/keys/client"),
        })
        .unwrap()
}

// ---------------------------------------------------------------------------
// Wallets and nodes
// ---------------------------------------------------------------------------

#[test]
fn wallets_get_sequential_ids_and_filter_by_enabled() {
    let (_dir, store) = temp_store();
    let a = store.add_wallet(address(1), PathBuf::from("a")).unwrap();
    let b = store.add_wallet(address(2), PathBuf::from("b")).unwrap();
    assert_eq!(a.id.0 + 1, b.id.0);

    store.set_wallet_enabled(a.id, false).unwrap();
    let enabled = store.list_wallets(EnabledFilter::Enabled).unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].id, b.id);
    assert_eq!(store.list_wallets(EnabledFilter::All).unwrap().len(), 2);
    assert_eq!(store.list_wallets(EnabledFilter::Disabled).unwrap()[0].id, a.id);
}

#[test]
fn balance_update_overwrites_cached_balance() {
    let (_dir, store) = temp_store();
    let w = store.add_wallet(address(1), PathBuf::from("a")).unwrap();
    store.update_balance(w.id, Nanotons::new(42)).unwrap();
    assert_eq!(store.get_wallet(w.id).unwrap().unwrap().balance, Nanotons::new(42));
}

#[test]
fn missing_wallet_operations_report_not_found() {
    let (_dir, store) = temp_store();
    let missing = elector_types::WalletId(99);
    assert!(matches!(
        store.update_balance(missing, Nanotons::ZERO),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(store.delete_wallet(missing), Err(StoreError::NotFound(_))));
}

#[test]
fn node_requires_existing_wallet() {
    let (_dir, store) = temp_store();
    let result = store.add_node(NewNode {
        wallet_id: elector_types::WalletId(7),
        host_port: "127.0.0.1:3030".into(),
        server_pub: PathBuf::from("s"),
        client_cert: PathBuf::from("c"),
    });
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn nodes_are_listed_per_wallet() {
    let (_dir, store) = temp_store();
    let node = new_node(&store, "10.0.0.1:3030");
    let other_wallet = store.add_wallet(address(9), PathBuf::from("x")).unwrap();

    assert_eq!(store.list_nodes(node.wallet_id, EnabledFilter::Enabled).unwrap(), vec![node.clone()]);
    assert!(store.list_nodes(other_wallet.id, EnabledFilter::All).unwrap().is_empty());

    store.delete_node(node.id).unwrap();
    assert!(store.get_node(node.id).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Elections
// ---------------------------------------------------------------------------

#[test]
fn election_is_written_once() {
    let (_dir, store) = temp_store();
    let w = window(51_820_000);
    store.add_election(&w).unwrap();

    let mut altered = w;
    altered.start_at = 1;
    assert!(matches!(store.add_election(&altered), Err(StoreError::Duplicate(_))));
    assert_eq!(store.get_election(w.election_id).unwrap(), Some(w));
}

#[test]
fn elections_list_oldest_first() {
    let (_dir, store) = temp_store();
    store.add_election(&window(2_000_000)).unwrap();
    store.add_election(&window(1_000_000)).unwrap();
    let ids: Vec<u64> = store
        .list_elections()
        .unwrap()
        .iter()
        .map(|w| w.election_id.as_u64())
        .collect();
    assert_eq!(ids, vec![1_000_000, 2_000_000]);
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[test]
fn key_records_are_unique_per_node_election_and_type() {
    let (_dir, store) = temp_store();
    let node = new_node(&store, "10.0.0.1:3030");
    let election = ElectionId::new(1_000);
    let record = KeyRecord {
        node_id: node.id,
        election_id: election,
        key_type: KeyType::Signing,
        handle: KeyHandle::new("ABC123"),
    };
    store.add_key(&record).unwrap();

    let dup = KeyRecord {
        handle: KeyHandle::new("OTHER"),
        ..record.clone()
    };
    assert!(matches!(store.add_key(&dup), Err(StoreError::Duplicate(_))));
    assert_eq!(
        store.get_key(node.id, election, KeyType::Signing).unwrap(),
        Some(record)
    );
    assert!(store.get_key(node.id, election, KeyType::Adnl).unwrap().is_none());
    assert!(store
        .get_key(node.id, ElectionId::new(2_000), KeyType::Signing)
        .unwrap()
        .is_none());
}

#[test]
fn registration_flag_is_tracked_separately() {
    let (_dir, store) = temp_store();
    let node = NodeId(1);
    let election = ElectionId::new(1_000);
    assert!(!store.is_registered(node, election, KeyType::Signing).unwrap());
    store.mark_registered(node, election, KeyType::Signing).unwrap();
    assert!(store.is_registered(node, election, KeyType::Signing).unwrap());
    assert!(!store.is_registered(node, election, KeyType::Adnl).unwrap());
}

// ---------------------------------------------------------------------------
// Participations
// ---------------------------------------------------------------------------

#[test]
fn participations_append_in_submission_order() {
    let (_dir, store) = temp_store();
    let election = ElectionId::new(1_000);
    let other = ElectionId::new(5_000);
    let bid = |node: u64, election: ElectionId, at: u64| Participation {
        node_id: NodeId(node),
        election_id: election,
        stake_amount: Nanotons::from_coins(10_000),
        max_factor: MaxFactor::new(2.7).unwrap(),
        submitted_at: Timestamp::new(at),
    };
    store.add_participation(&bid(1, election, 100)).unwrap();
    store.add_participation(&bid(1, election, 100)).unwrap();
    store.add_participation(&bid(1, other, 300)).unwrap();
    store.add_participation(&bid(2, election, 400)).unwrap();

    assert_eq!(store.participations(NodeId(1), election).unwrap().len(), 2);
    assert_eq!(store.node_participations(NodeId(1)).unwrap().len(), 3);
    assert_eq!(store.participations(NodeId(2), other).unwrap().len(), 0);
}

#[test]
fn participation_scan_stops_at_neighbouring_keys() {
    let (_dir, store) = temp_store();
    let bid = |node: u64, election: u64| Participation {
        node_id: NodeId(node),
        election_id: ElectionId::new(election),
        stake_amount: Nanotons::from_coins(10_000),
        max_factor: MaxFactor::new(2.7).unwrap(),
        submitted_at: Timestamp::new(election),
    };
    store.add_participation(&bid(1, 255)).unwrap();
    store.add_participation(&bid(1, 256)).unwrap();
    store.add_participation(&bid(2, 0)).unwrap();
    store.add_participation(&bid(u64::MAX, u64::MAX)).unwrap();
    store.add_participation(&bid(u64::MAX, 7)).unwrap();

    let only = store.participations(NodeId(1), ElectionId::new(255)).unwrap();
    assert_eq!(only, vec![bid(1, 255)]);
    assert_eq!(store.node_participations(NodeId(1)).unwrap().len(), 2);
    assert_eq!(
        store
            .participations(NodeId(u64::MAX), ElectionId::new(u64::MAX))
            .unwrap(),
        vec![bid(u64::MAX, u64::MAX)]
    );
    assert_eq!(store.node_participations(NodeId(u64::MAX)).unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Schema and persistence
// ---------------------------------------------------------------------------

#[test]
fn fresh_ledger_is_stamped_with_current_schema() {
    let (_dir, store) = temp_store();
    assert_eq!(store.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        store.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
    }
    assert!(LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).is_err());
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let election = window(1_000_000);
    {
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        store.add_wallet(address(3), PathBuf::from("w")).unwrap();
        store.add_election(&election).unwrap();
    }
    let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
    assert_eq!(store.list_wallets(EnabledFilter::All).unwrap().len(), 1);
    assert_eq!(store.get_election(election.election_id).unwrap(), Some(election));
    // counters continue after reopen
    let next = store.add_wallet(address(4), PathBuf::from("v")).unwrap();
    assert_eq!(next.id.0, 2);
}
