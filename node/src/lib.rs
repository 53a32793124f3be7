//! Elector bot core: takes part in validator elections on behalf of a set
//! of wallets and their validator nodes.
//!
//! On every tick the orchestrator:
//! - Resolves the elector and the open election, persisting its window once
//! - Syncs cached wallet balances with the chain
//! - Recovers stakes and rewards the elector is ready to return
//! - Creates and registers per-election validator keys on each node
//! - Submits one stake bid per node, unless the chain already holds one
//!
//! All state that outlives a tick is kept in the ledger.

pub mod balance_sync;
pub mod config;
pub mod election_monitor;
pub mod error;
pub mod key_lifecycle;
pub mod metrics;
pub mod orchestrator;
pub mod reward_recovery;
pub mod service;
pub mod shutdown;
pub mod stake_submission;
pub mod tracing_spans;

pub use balance_sync::BalanceSync;
pub use config::ElectorConfig;
pub use election_monitor::ElectionMonitor;
pub use error::NodeError;
pub use key_lifecycle::{KeyLifecycle, KeyOutcome, ValidatorKeys};
pub use metrics::OrchestratorMetrics;
pub use orchestrator::{
    Collaborators, NodeOutcome, NodeReport, Orchestrator, OrchestratorSettings, StepFailure,
    TickReport, WalletOutcome, WalletReport,
};
pub use reward_recovery::{RecoveryOutcome, RewardRecovery};
pub use service::ElectorService;
pub use shutdown::ShutdownController;
pub use stake_submission::{StakePolicy, StakeSubmission};

pub use elector_utils::{init_logging, LogFormat};
