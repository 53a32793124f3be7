//! Orchestrator: one pass over every enabled wallet and node per tick.
//!
//! A tick resolves the elector and the open election, then for each
//! wallet syncs its balance, recovers returned stakes and, when an
//! election is open and the balance covers the minimum stake, makes sure
//! every node holds registered keys and has a bid on the chain.
//!
//! Nothing survives a tick in memory. Every decision is re-derived from
//! the ledger and the chain, so a restarted process picks up where the
//! previous one stopped.
//!
//! Failures are contained at the smallest entity they concern: a node
//! that cannot be reached only fails that node, and a wallet whose
//! balance cannot be read only loses its fresh balance. An election that
//! cannot be read keeps every node idle while recovery carries on. Ledger
//! and configuration failures ([`NodeError::is_fatal`]) abort the tick
//! and are returned.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn, Span};

use elector_store::{EnabledFilter, Ledger, NodeStore, WalletStore};
use elector_toolchain::{ChainQuery, NodeConsole, TxComposer};
use elector_types::{
    AccountAddress, ElectionId, ElectionWindow, MaxFactor, Nanotons, Node, NodeId, Participation,
    StakeBounds, Timestamp, Wallet, WalletId,
};
use elector_utils::{Clock, Pacer};

use crate::balance_sync::BalanceSync;
use crate::config::ElectorConfig;
use crate::election_monitor::ElectionMonitor;
use crate::key_lifecycle::{KeyLifecycle, KeyOutcome};
use crate::metrics::OrchestratorMetrics;
use crate::reward_recovery::{RecoveryOutcome, RewardRecovery};
use crate::stake_submission::{StakePolicy, StakeSubmission};
use crate::tracing_spans::{node_span, record_election, tick_span, wallet_span};
use crate::NodeError;

/// The external world the orchestrator works against.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn Ledger>,
    pub chain: Arc<dyn ChainQuery>,
    pub console: Arc<dyn NodeConsole>,
    pub composer: Arc<dyn TxComposer>,
    pub clock: Arc<dyn Clock>,
    pub pacer: Arc<dyn Pacer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorSettings {
    pub stake: Nanotons,
    pub max_factor: MaxFactor,
    pub submission_cooldown: Duration,
    pub resubmit_after_secs: u64,
    pub max_node_lag_secs: u64,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ElectorConfig) -> Self {
        Self {
            stake: config.stake(),
            max_factor: config.max_factor,
            submission_cooldown: config.submission_cooldown(),
            resubmit_after_secs: config.resubmit_after_secs,
            max_node_lag_secs: config.max_node_lag_secs,
        }
    }
}

/// A step that failed without taking the tick down with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeOutcome {
    Submitted(Participation),
    AlreadyStaked { amount: Nanotons },
    /// A bid was sent recently and the chain has not caught up yet.
    SubmissionInFlight { since: Timestamp },
    Failed(StepFailure),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeReport {
    pub node: NodeId,
    pub outcome: NodeOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WalletOutcome {
    /// Nodes were visited; see [`WalletReport::nodes`].
    Processed,
    NoElection,
    BalanceTooLow { balance: Nanotons, min_stake: Nanotons },
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalletReport {
    pub wallet: WalletId,
    /// Balance used for the minimum stake check.
    pub balance: Nanotons,
    /// Set when the on-chain balance could not be read and the cached one
    /// was used instead.
    pub balance_failure: Option<StepFailure>,
    pub recovery: Result<RecoveryOutcome, StepFailure>,
    pub outcome: WalletOutcome,
    pub nodes: Vec<NodeReport>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub election: Option<ElectionId>,
    /// Set when the election or its stake bounds could not be read. Nodes
    /// are skipped for this tick; wallets still sync and recover.
    pub election_failure: Option<StepFailure>,
    pub wallets: Vec<WalletReport>,
}

impl TickReport {
    pub fn wallet(&self, id: WalletId) -> Option<&WalletReport> {
        self.wallets.iter().find(|w| w.wallet == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeReport> {
        self.wallets
            .iter()
            .flat_map(|w| &w.nodes)
            .find(|n| n.node == id)
    }

    /// Bids handed to the chain during this tick.
    pub fn submitted(&self) -> Vec<&Participation> {
        self.wallets
            .iter()
            .flat_map(|w| &w.nodes)
            .filter_map(|n| match &n.outcome {
                NodeOutcome::Submitted(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        let per_wallet: usize = self
            .wallets
            .iter()
            .map(|w| {
                usize::from(w.balance_failure.is_some())
                    + usize::from(w.recovery.is_err())
                    + w.nodes
                        .iter()
                        .filter(|n| matches!(n.outcome, NodeOutcome::Failed(_)))
                        .count()
            })
            .sum();
        usize::from(self.election_failure.is_some()) + per_wallet
    }
}

pub struct Orchestrator {
    ledger: Arc<dyn Ledger>,
    chain: Arc<dyn ChainQuery>,
    console: Arc<dyn NodeConsole>,
    pacer: Arc<dyn Pacer>,
    monitor: ElectionMonitor,
    keys: KeyLifecycle,
    stakes: StakeSubmission,
    recovery: RewardRecovery,
    balances: BalanceSync,
    settings: OrchestratorSettings,
    metrics: Arc<OrchestratorMetrics>,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        settings: OrchestratorSettings,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        let Collaborators {
            ledger,
            chain,
            console,
            composer,
            clock,
            pacer,
        } = collaborators;

        let policy = StakePolicy {
            amount: settings.stake,
            max_factor: settings.max_factor,
            resubmit_after_secs: settings.resubmit_after_secs,
        };

        Self {
            monitor: ElectionMonitor::new(ledger.clone(), chain.clone()),
            keys: KeyLifecycle::new(
                ledger.clone(),
                chain.clone(),
                console.clone(),
                metrics.clone(),
            ),
            stakes: StakeSubmission::new(
                ledger.clone(),
                chain.clone(),
                console.clone(),
                composer.clone(),
                clock,
                metrics.clone(),
                policy,
            ),
            recovery: RewardRecovery::new(chain.clone(), composer, metrics.clone()),
            balances: BalanceSync::new(ledger.clone(), chain.clone()),
            ledger,
            chain,
            console,
            pacer,
            settings,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<OrchestratorMetrics> {
        &self.metrics
    }

    /// Refresh the cached balance of every enabled wallet. Run once at
    /// startup, before the first tick.
    pub fn sync_balances(&self) -> Result<usize, NodeError> {
        self.balances.sync_all()
    }

    /// Run one pass over all enabled wallets and their nodes.
    pub fn tick(&self) -> Result<TickReport, NodeError> {
        let span = tick_span();
        let _enter = span.enter();
        self.metrics.ticks.inc();

        let result = self.run_tick(&span);
        match &result {
            Ok(report) => info!(
                wallets = report.wallets.len(),
                submitted = report.submitted().len(),
                failures = report.failures(),
                "tick complete"
            ),
            Err(e) => {
                self.metrics.failed_ticks.inc();
                error!(error = %e, fatal = e.is_fatal(), "tick aborted");
            }
        }
        result
    }

    fn run_tick(&self, span: &Span) -> Result<TickReport, NodeError> {
        let elector = self.chain.elector_address()?;

        let mut election_failure = None;
        let window = match self.contain("resolve_election", self.monitor.resolve(&elector))? {
            Ok(window) => window,
            Err(failure) => {
                election_failure = Some(failure);
                None
            }
        };

        let active = window.map_or(0, |w| w.election_id.as_u64());
        self.metrics
            .active_election
            .set(i64::try_from(active).unwrap_or(i64::MAX));
        if let Some(w) = &window {
            record_election(span, w.election_id);
        }

        let wallets = self.ledger.list_wallets(EnabledFilter::Enabled)?;
        let bounds = match window {
            Some(_) if !wallets.is_empty() => {
                let bounds = self.chain.stake_bounds().map_err(NodeError::from);
                match self.contain("stake_bounds", bounds)? {
                    Ok(bounds) => Some(bounds),
                    Err(failure) => {
                        election_failure = Some(failure);
                        None
                    }
                }
            }
            _ => None,
        };

        // Without bounds no node is visited, but recovery still runs.
        let target = window.zip(bounds);
        let mut reports = Vec::with_capacity(wallets.len());
        for wallet in &wallets {
            let span = wallet_span(wallet);
            let _enter = span.enter();
            reports.push(self.process_wallet(wallet, &elector, target)?);
        }

        Ok(TickReport {
            election: window.map(|w| w.election_id),
            election_failure,
            wallets: reports,
        })
    }

    fn process_wallet(
        &self,
        wallet: &Wallet,
        elector: &AccountAddress,
        target: Option<(ElectionWindow, StakeBounds)>,
    ) -> Result<WalletReport, NodeError> {
        let (balance, balance_failure) =
            match self.contain("balance_sync", self.balances.sync(wallet))? {
                Ok(balance) => (balance, None),
                Err(failure) => (wallet.balance, Some(failure)),
            };

        let recovery = self.contain("recovery", self.recovery.recover_if_due(wallet, elector))?;
        if matches!(recovery, Ok(RecoveryOutcome::Submitted { .. })) {
            self.pacer.pause(self.settings.submission_cooldown);
        }

        let mut report = WalletReport {
            wallet: wallet.id,
            balance,
            balance_failure,
            recovery,
            outcome: WalletOutcome::Processed,
            nodes: Vec::new(),
        };

        let Some((window, bounds)) = target else {
            report.outcome = WalletOutcome::NoElection;
            return Ok(report);
        };
        if balance < bounds.min_stake {
            info!(
                balance = %balance,
                min_stake = %bounds.min_stake,
                "balance below minimum stake, skipping nodes"
            );
            report.outcome = WalletOutcome::BalanceTooLow {
                balance,
                min_stake: bounds.min_stake,
            };
            return Ok(report);
        }

        for node in self.ledger.list_nodes(wallet.id, EnabledFilter::Enabled)? {
            let span = node_span(&node);
            let _enter = span.enter();
            let outcome = self.process_node(wallet, &node, &window, elector)?;
            report.nodes.push(NodeReport {
                node: node.id,
                outcome,
            });
        }
        Ok(report)
    }

    fn process_node(
        &self,
        wallet: &Wallet,
        node: &Node,
        window: &ElectionWindow,
        elector: &AccountAddress,
    ) -> Result<NodeOutcome, NodeError> {
        self.check_sync(node);

        let keys = match self.contain("ensure_keys", self.keys.ensure_keys(node, window, elector))? {
            Ok(KeyOutcome::Ready(keys)) => keys,
            Ok(KeyOutcome::AlreadyStaked { amount }) => {
                return Ok(NodeOutcome::AlreadyStaked { amount })
            }
            Err(failure) => return Ok(NodeOutcome::Failed(failure)),
        };

        if let Some(since) = self.stakes.in_flight(node.id, window.election_id)? {
            info!(submitted_at = %since, "bid already in flight");
            return Ok(NodeOutcome::SubmissionInFlight { since });
        }

        let submitted = self.stakes.submit(wallet, node, window.election_id, &keys, elector);
        match self.contain("submit_stake", submitted)? {
            Ok(participation) => {
                self.pacer.pause(self.settings.submission_cooldown);
                Ok(NodeOutcome::Submitted(participation))
            }
            Err(failure) => Ok(NodeOutcome::Failed(failure)),
        }
    }

    /// Warn about a node lagging behind the masterchain. Never blocks the
    /// node from bidding.
    fn check_sync(&self, node: &Node) {
        match self.console.stats(node) {
            Ok(stats) if stats.lag_secs() > self.settings.max_node_lag_secs => {
                warn!(lag_secs = stats.lag_secs(), "node is out of sync")
            }
            Ok(stats) => debug!(lag_secs = stats.lag_secs(), "node in sync"),
            Err(e) => warn!(error = %e, "node stats unavailable"),
        }
    }

    /// Split a step result into fatal errors, which are returned, and
    /// transient ones, which are logged and handed back as a
    /// [`StepFailure`].
    fn contain<T>(
        &self,
        step: &'static str,
        result: Result<T, NodeError>,
    ) -> Result<Result<T, StepFailure>, NodeError> {
        match result {
            Ok(value) => Ok(Ok(value)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(step, error = %e, "step failed, retrying next tick");
                self.metrics.entity_failures.inc();
                Ok(Err(StepFailure {
                    step,
                    error: e.to_string(),
                }))
            }
        }
    }
}
