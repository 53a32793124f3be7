//! Service runner: drives the orchestrator on the tick timer until
//! shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::orchestrator::{Orchestrator, TickReport};
use crate::NodeError;

pub struct ElectorService {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    metrics_file: Option<PathBuf>,
}

impl ElectorService {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        interval: Duration,
        metrics_file: Option<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            interval,
            metrics_file,
        }
    }

    /// Sync wallet balances, then tick every `interval` until `shutdown`
    /// fires or a tick fails fatally.
    ///
    /// Ticks run on the blocking pool; the console, chain and composer are
    /// driven through external processes. A tick that overruns the interval
    /// delays the next one instead of bunching ticks up.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), NodeError> {
        let orchestrator = self.orchestrator.clone();
        let synced = tokio::task::spawn_blocking(move || orchestrator.sync_balances())
            .await
            .map_err(|e| NodeError::Worker(e.to_string()))??;
        tracing::info!(wallets = synced, "startup balance sync complete");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("elector service shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let result = self.tick_once().await;
                    self.write_metrics();
                    match result {
                        Ok(_) => {}
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => tracing::warn!(error = %e, "tick failed, retrying next interval"),
                    }
                }
            }
        }
        Ok(())
    }

    async fn tick_once(&self) -> Result<TickReport, NodeError> {
        let orchestrator = self.orchestrator.clone();
        tokio::task::spawn_blocking(move || orchestrator.tick())
            .await
            .map_err(|e| NodeError::Worker(e.to_string()))?
    }

    fn write_metrics(&self) {
        let Some(path) = &self.metrics_file else {
            return;
        };
        if let Err(e) = self.orchestrator.metrics().write_textfile(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write metrics");
        }
    }
}
