//! End-to-end orchestrator ticks against the nullable collaborators.
//!
//! Each test scripts the chain, the node consoles and the ledger, runs one
//! or more ticks and checks what reached the outside world.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use elector_node::{
    Collaborators, ElectorConfig, NodeOutcome, Orchestrator, OrchestratorMetrics,
    OrchestratorSettings, RecoveryOutcome, WalletOutcome,
};
use elector_nullables::{
    ComposerCall, ConsoleCall, NullChain, NullClock, NullComposer, NullConsole, NullLedger,
    NullPacer,
};
use elector_store::{ElectionStore, KeyStore, Ledger, NewNode, NodeStore, ParticipationStore, WalletStore};
use elector_store_lmdb::{LmdbStore, DEFAULT_MAP_SIZE};
use elector_types::{
    AccountAddress, ElectionId, ElectionTiming, KeyHandle, KeyType, Nanotons, Node, StakeBounds,
    Wallet,
};

const ELECTION: u64 = 51_820_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fakes {
    chain: Arc<NullChain>,
    console: Arc<NullConsole>,
    composer: Arc<NullComposer>,
    clock: Arc<NullClock>,
    pacer: Arc<NullPacer>,
}

impl Fakes {
    fn new() -> Self {
        Self {
            chain: Arc::new(NullChain::new()),
            console: Arc::new(NullConsole::new()),
            composer: Arc::new(NullComposer::new()),
            clock: Arc::new(NullClock::new(1_700_000_000)),
            pacer: Arc::new(NullPacer::new()),
        }
    }

    fn orchestrator(&self, ledger: Arc<dyn Ledger>) -> Orchestrator {
        let collaborators = Collaborators {
            ledger,
            chain: self.chain.clone(),
            console: self.console.clone(),
            composer: self.composer.clone(),
            clock: self.clock.clone(),
            pacer: self.pacer.clone(),
        };
        let settings = OrchestratorSettings::from_config(&ElectorConfig::default());
        let metrics = Arc::new(OrchestratorMetrics::new().expect("metrics"));
        Orchestrator::new(collaborators, settings, metrics)
    }

    fn open_election(&self) {
        self.chain.set_active_election(ELECTION);
        self.chain.set_timing(ElectionTiming {
            validators_elected_for: 65_536,
            elections_start_before: 3_600,
            elections_end_before: 1_800,
            stake_held_for: 32_768,
        });
    }
}

struct World {
    ledger: Arc<NullLedger>,
    fakes: Fakes,
    orchestrator: Orchestrator,
}

fn world() -> World {
    let ledger = Arc::new(NullLedger::new());
    let fakes = Fakes::new();
    let orchestrator = fakes.orchestrator(ledger.clone());
    World {
        ledger,
        fakes,
        orchestrator,
    }
}

fn add_wallet(ledger: &dyn Ledger, chain: &NullChain, seed: u8, coins: u64) -> Wallet {
    let wallet = ledger
        .add_wallet(
            AccountAddress::new(-1, [seed; 32]),
            PathBuf::from(format!("/keys/wallet{seed}")),
        )
        .expect("add wallet");
    chain.set_balance(wallet.address, Nanotons::from_coins(coins));
    wallet
}

fn add_node(ledger: &dyn Ledger, wallet: &Wallet, last_octet: u8) -> Node {
    ledger
        .add_node(NewNode {
            wallet_id: wallet.id,
            host_port: format!("10.0.0.{last_octet}:3030"),
            server_pub: PathBuf::from("/keys/server.pub"),
            client_cert: PathBuf::from("/keys/client"),
        })
        .expect("add node")
}

fn election_requests(composer: &NullComposer) -> usize {
    composer
        .calls()
        .iter()
        .filter(|c| matches!(c, ComposerCall::ElectionRequest { .. }))
        .count()
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[test]
fn tick_bids_for_every_node_of_a_funded_wallet() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let n1 = add_node(w.ledger.as_ref(), &wallet, 1);
    let n2 = add_node(w.ledger.as_ref(), &wallet, 2);

    let report = w.orchestrator.tick().expect("tick");

    assert_eq!(report.election, Some(ElectionId::new(ELECTION)));
    assert_eq!(report.submitted().len(), 2);
    assert!(matches!(
        report.node(n1.id).unwrap().outcome,
        NodeOutcome::Submitted(_)
    ));
    assert!(matches!(
        report.node(n2.id).unwrap().outcome,
        NodeOutcome::Submitted(_)
    ));
    assert_eq!(report.failures(), 0);

    // three keys per node: signing, public, adnl
    assert_eq!(w.ledger.key_records().len(), 6);
    assert_eq!(w.ledger.all_participations().len(), 2);
    assert_eq!(w.fakes.chain.submitted().len(), 2);
    assert_eq!(
        w.fakes.pacer.pauses(),
        vec![Duration::from_secs(10), Duration::from_secs(10)]
    );

    let stored = w.ledger.get_wallet(wallet.id).unwrap().unwrap();
    assert_eq!(stored.balance, Nanotons::from_coins(50_000));
    assert_eq!(w.orchestrator.metrics().stakes_submitted.get(), 2);
    assert_eq!(w.orchestrator.metrics().active_election.get(), ELECTION as i64);
}

#[test]
fn election_window_matches_network_timing_and_is_kept() {
    let w = world();
    w.fakes.open_election();
    w.orchestrator.tick().expect("first tick");

    let window = w
        .ledger
        .get_election(ElectionId::new(ELECTION))
        .unwrap()
        .expect("window stored");
    assert_eq!(window.start_at, 51_816_400);
    assert_eq!(window.close_at, 51_818_200);
    assert_eq!(window.next_elections_at, 51_823_600);

    w.fakes.chain.set_timing(ElectionTiming {
        validators_elected_for: 65_536,
        elections_start_before: 7_200,
        elections_end_before: 600,
        stake_held_for: 32_768,
    });
    w.orchestrator.tick().expect("second tick");
    assert_eq!(
        w.ledger.get_election(ElectionId::new(ELECTION)).unwrap(),
        Some(window)
    );
    assert_eq!(w.ledger.list_elections().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[test]
fn second_tick_sends_no_further_node_commands() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);

    w.orchestrator.tick().expect("first tick");
    let mutations = w.fakes.console.mutation_count();
    let keys = w.ledger.key_records();

    let report = w.orchestrator.tick().expect("second tick");
    assert!(matches!(
        report.node(node.id).unwrap().outcome,
        NodeOutcome::SubmissionInFlight { .. }
    ));
    assert_eq!(w.fakes.console.mutation_count(), mutations);
    assert_eq!(w.ledger.key_records(), keys);
    assert_eq!(w.fakes.chain.submitted().len(), 1);
}

#[test]
fn node_with_stake_on_chain_is_never_bid_for() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);

    // The first key the console hands out becomes the signing key.
    let public = NullConsole::public_key_of(&KeyHandle::new("KEY1"));
    w.fakes
        .chain
        .set_staked(&public.public_key_hex().unwrap(), Nanotons::from_coins(20_000));

    let report = w.orchestrator.tick().expect("tick");
    assert_eq!(
        report.node(node.id).unwrap().outcome,
        NodeOutcome::AlreadyStaked {
            amount: Nanotons::from_coins(20_000)
        }
    );
    assert_eq!(election_requests(&w.fakes.composer), 0);
    assert!(w.fakes.chain.submitted().is_empty());
    assert!(w.fakes.pacer.pauses().is_empty());
    assert!(!w
        .fakes
        .console
        .calls_for(node.id)
        .iter()
        .any(|c| matches!(c, ConsoleCall::AddAdnl { .. } | ConsoleCall::Sign { .. })));
}

#[test]
fn accepted_bid_stops_further_bids() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);
    w.orchestrator.tick().expect("first tick");

    let public = w
        .ledger
        .get_key(node.id, ElectionId::new(ELECTION), KeyType::Public)
        .unwrap()
        .expect("public key stored")
        .handle;
    w.fakes
        .chain
        .set_staked(&public.public_key_hex().unwrap(), Nanotons::from_coins(20_000));
    w.fakes.clock.advance(3_600);

    let report = w.orchestrator.tick().expect("second tick");
    assert!(matches!(
        report.node(node.id).unwrap().outcome,
        NodeOutcome::AlreadyStaked { .. }
    ));
    assert_eq!(election_requests(&w.fakes.composer), 1);
}

#[test]
fn bid_is_repeated_once_the_grace_period_has_passed() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);

    w.orchestrator.tick().expect("first tick");
    let before = w.fakes.console.calls_for(node.id).len();

    w.fakes.clock.advance(600);
    let report = w.orchestrator.tick().expect("within grace");
    assert!(matches!(
        report.node(node.id).unwrap().outcome,
        NodeOutcome::SubmissionInFlight { .. }
    ));

    w.fakes.clock.advance(300);
    let report = w.orchestrator.tick().expect("after grace");
    assert!(matches!(
        report.node(node.id).unwrap().outcome,
        NodeOutcome::Submitted(_)
    ));
    assert_eq!(
        w.ledger
            .participations(node.id, ElectionId::new(ELECTION))
            .unwrap()
            .len(),
        2
    );

    // Only sync checks and the new signature; keys are reused.
    let new_calls: Vec<_> = w.fakes.console.calls_for(node.id)[before..].to_vec();
    let mutations: Vec<_> = new_calls.iter().filter(|c| c.is_mutation()).collect();
    assert_eq!(mutations.len(), 1);
    assert!(matches!(mutations[0], ConsoleCall::Sign { .. }));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn new_signing_key_is_stored_and_registered_once() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);
    w.fakes.console.queue_keys(["ABC123"]);

    w.orchestrator.tick().expect("tick");

    let signing = w
        .ledger
        .get_key(node.id, ElectionId::new(ELECTION), KeyType::Signing)
        .unwrap()
        .expect("signing key stored");
    assert_eq!(signing.handle, KeyHandle::new("ABC123"));

    let calls = w.fakes.console.calls_for(node.id);
    let permanent: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            ConsoleCall::AddPermanentKey { key, expire_at, .. } => Some((key.clone(), *expire_at)),
            _ => None,
        })
        .collect();
    let temporary: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            ConsoleCall::AddTemporaryKey { key, expire_at, .. } => Some((key.clone(), *expire_at)),
            _ => None,
        })
        .collect();
    assert_eq!(permanent, vec![(KeyHandle::new("ABC123"), ELECTION + 70_000)]);
    assert_eq!(
        temporary,
        vec![(KeyHandle::new("ABC123"), ELECTION + 65_536 + 10_000)]
    );
}

#[test]
fn wallet_below_minimum_stake_skips_its_nodes() {
    let w = world();
    w.fakes.open_election();
    w.fakes.chain.set_bounds(StakeBounds {
        min_stake: Nanotons::new(20_000_000_000),
        max_stake: Nanotons::from_coins(10_000_000),
        min_total_stake: Nanotons::from_coins(100_000),
        max_stake_factor: 196_608,
    });
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 0);
    w.fakes
        .chain
        .set_balance(wallet.address, Nanotons::new(5_000_000_000));
    add_node(w.ledger.as_ref(), &wallet, 1);

    let report = w.orchestrator.tick().expect("tick");
    let wallet_report = report.wallet(wallet.id).unwrap();
    assert_eq!(
        wallet_report.outcome,
        WalletOutcome::BalanceTooLow {
            balance: Nanotons::new(5_000_000_000),
            min_stake: Nanotons::new(20_000_000_000),
        }
    );
    assert!(wallet_report.nodes.is_empty());
    assert!(w.fakes.console.calls().is_empty());
    assert_eq!(w.fakes.chain.call_count("staked_amount"), 0);
    assert!(w.fakes.composer.calls().is_empty());
    assert!(w.ledger.key_records().is_empty());
}

#[test]
fn zero_reward_sends_no_recovery() {
    let w = world();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);

    let report = w.orchestrator.tick().expect("tick");
    let wallet_report = report.wallet(wallet.id).unwrap();
    assert_eq!(wallet_report.recovery, Ok(RecoveryOutcome::NothingDue));
    assert_eq!(wallet_report.outcome, WalletOutcome::NoElection);
    assert!(w.fakes.chain.submitted().is_empty());
    assert_eq!(w.fakes.chain.call_count("claimable_reward"), 1);
}

#[test]
fn recovery_and_bid_in_one_tick_use_increasing_seqnos() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    add_node(w.ledger.as_ref(), &wallet, 1);
    w.fakes.chain.set_seqno(wallet.address, 5);
    w.fakes
        .chain
        .set_reward(&wallet.address.hash_hex(), Nanotons::from_coins(20_300));

    let report = w.orchestrator.tick().expect("tick");
    assert_eq!(
        report.wallet(wallet.id).unwrap().recovery,
        Ok(RecoveryOutcome::Submitted {
            amount: Nanotons::from_coins(20_300)
        })
    );

    let transfers = w.fakes.composer.transfers();
    assert_eq!(
        transfers,
        vec![
            (5, Nanotons::from_coins(1), true),
            (6, Nanotons::from_coins(20_000), true),
        ]
    );
    assert!(transfers.windows(2).all(|t| t[0].0 < t[1].0));
    assert_eq!(w.fakes.pacer.pauses().len(), 2);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[test]
fn unreachable_node_does_not_stop_its_siblings() {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let down = add_node(w.ledger.as_ref(), &wallet, 1);
    let up = add_node(w.ledger.as_ref(), &wallet, 2);
    w.fakes.console.fail_node(down.id);

    let report = w.orchestrator.tick().expect("tick");
    match &report.node(down.id).unwrap().outcome {
        NodeOutcome::Failed(failure) => assert_eq!(failure.step, "ensure_keys"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(
        report.node(up.id).unwrap().outcome,
        NodeOutcome::Submitted(_)
    ));
    assert_eq!(report.failures(), 1);
    assert_eq!(w.orchestrator.metrics().entity_failures.get(), 1);

    // The healthy node reuses its keys on the retry.
    let stored = w.ledger.key_records().len();
    w.orchestrator.tick().expect("retry tick");
    assert_eq!(w.ledger.key_records().len(), stored);
}

#[test]
fn unreadable_wallet_falls_back_to_cached_balance_and_spares_others() {
    let w = world();
    w.fakes.open_election();
    let broken = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let healthy = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 2, 50_000);
    let broken_node = add_node(w.ledger.as_ref(), &broken, 1);
    let healthy_node = add_node(w.ledger.as_ref(), &healthy, 2);

    w.ledger
        .update_balance(broken.id, Nanotons::from_coins(40_000))
        .unwrap();
    w.fakes.chain.fail_account(broken.address);

    let report = w.orchestrator.tick().expect("tick");

    let broken_report = report.wallet(broken.id).unwrap();
    assert_eq!(broken_report.balance, Nanotons::from_coins(40_000));
    assert_eq!(broken_report.balance_failure.as_ref().unwrap().step, "balance_sync");
    assert_eq!(broken_report.outcome, WalletOutcome::Processed);
    match &report.node(broken_node.id).unwrap().outcome {
        NodeOutcome::Failed(failure) => assert_eq!(failure.step, "submit_stake"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(w
        .ledger
        .participations(broken_node.id, ElectionId::new(ELECTION))
        .unwrap()
        .is_empty());

    assert!(matches!(
        report.node(healthy_node.id).unwrap().outcome,
        NodeOutcome::Submitted(_)
    ));
}

#[test]
fn chain_outage_aborts_tick_without_being_fatal() {
    let w = world();
    w.fakes.chain.fail_method("elector_address");
    let err = w.orchestrator.tick().unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(w.orchestrator.metrics().failed_ticks.get(), 1);
}

fn recovery_survives_unreadable_election(method: &'static str) {
    let w = world();
    w.fakes.open_election();
    let wallet = add_wallet(w.ledger.as_ref(), &w.fakes.chain, 1, 50_000);
    let node = add_node(w.ledger.as_ref(), &wallet, 1);
    w.fakes
        .chain
        .set_reward(&wallet.address.hash_hex(), Nanotons::from_coins(20_300));
    w.fakes.chain.fail_method(method);

    let report = w.orchestrator.tick().expect("tick survives");

    assert_eq!(report.election_failure.as_ref().map(|f| f.step), Some(step_of(method)));
    let wallet_report = report.wallet(wallet.id).unwrap();
    assert_eq!(
        wallet_report.recovery,
        Ok(RecoveryOutcome::Submitted {
            amount: Nanotons::from_coins(20_300)
        })
    );
    assert_eq!(wallet_report.outcome, WalletOutcome::NoElection);
    assert!(report.node(node.id).is_none());
    assert_eq!(w.fakes.chain.submitted().len(), 1);
    assert!(w.fakes.console.calls().is_empty());
    assert_eq!(w.orchestrator.metrics().failed_ticks.get(), 0);
    assert_eq!(report.failures(), 1);
}

fn step_of(method: &str) -> &'static str {
    match method {
        "stake_bounds" => "stake_bounds",
        _ => "resolve_election",
    }
}

#[test]
fn unreadable_stake_bounds_still_recover_rewards() {
    recovery_survives_unreadable_election("stake_bounds");
}

#[test]
fn unreadable_active_election_still_recovers_rewards() {
    recovery_survives_unreadable_election("active_election_id");
}

#[test]
fn unreadable_election_timing_still_recovers_rewards() {
    recovery_survives_unreadable_election("election_timing");
}

#[test]
fn ledger_outage_is_fatal() {
    let w = world();
    w.fakes.open_election();
    w.ledger.set_unavailable(true);
    let err = w.orchestrator.tick().unwrap_err();
    assert!(err.is_fatal());
    assert!(w.fakes.console.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Persistence across restarts
// ---------------------------------------------------------------------------

#[test]
fn restarted_process_resumes_from_lmdb_ledger() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fakes = Fakes::new();
    fakes.open_election();

    let node_id = {
        let ledger = Arc::new(LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open"));
        let wallet = add_wallet(ledger.as_ref(), &fakes.chain, 1, 50_000);
        let node = add_node(ledger.as_ref(), &wallet, 1);
        let orchestrator = fakes.orchestrator(ledger);
        let report = orchestrator.tick().expect("tick before restart");
        assert_eq!(report.submitted().len(), 1);
        node.id
    };
    let mutations = fakes.console.mutation_count();

    let ledger = Arc::new(LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("reopen"));
    let orchestrator = fakes.orchestrator(ledger.clone());
    let report = orchestrator.tick().expect("tick after restart");

    assert!(matches!(
        report.node(node_id).unwrap().outcome,
        NodeOutcome::SubmissionInFlight { .. }
    ));
    assert_eq!(fakes.console.mutation_count(), mutations);
    assert!(ledger
        .is_registered(node_id, ElectionId::new(ELECTION), KeyType::Adnl)
        .unwrap());
}
