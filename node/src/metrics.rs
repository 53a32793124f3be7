//! Prometheus metrics for the orchestrator.
//!
//! [`OrchestratorMetrics`] owns a dedicated [`Registry`]. The service
//! writes it in the text exposition format to a file after every tick, for
//! pickup by node_exporter's textfile collector.

use std::path::Path;

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct OrchestratorMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Ticks started.
    pub ticks: IntCounter,
    /// Ticks aborted before every wallet was visited.
    pub failed_ticks: IntCounter,
    /// Keys created on validator nodes.
    pub keys_created: IntCounter,
    /// Stake bids handed to the chain.
    pub stakes_submitted: IntCounter,
    /// Stake recovery requests handed to the chain.
    pub recoveries_submitted: IntCounter,
    /// Wallet or node steps that failed and were skipped until the next tick.
    pub entity_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Currently open election id, 0 when none.
    pub active_election: IntGauge,
}

impl OrchestratorMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let ticks = register_int_counter_with_registry!(
            Opts::new("elector_ticks_total", "Orchestrator ticks started"),
            registry
        )?;

        let failed_ticks = register_int_counter_with_registry!(
            Opts::new(
                "elector_failed_ticks_total",
                "Orchestrator ticks aborted by an error"
            ),
            registry
        )?;

        let keys_created = register_int_counter_with_registry!(
            Opts::new(
                "elector_keys_created_total",
                "Validator keys created on nodes"
            ),
            registry
        )?;

        let stakes_submitted = register_int_counter_with_registry!(
            Opts::new(
                "elector_stakes_submitted_total",
                "Stake bids submitted to the elector"
            ),
            registry
        )?;

        let recoveries_submitted = register_int_counter_with_registry!(
            Opts::new(
                "elector_recoveries_submitted_total",
                "Stake recovery requests submitted"
            ),
            registry
        )?;

        let entity_failures = register_int_counter_with_registry!(
            Opts::new(
                "elector_entity_failures_total",
                "Wallet or node steps skipped after a transient failure"
            ),
            registry
        )?;

        let active_election = register_int_gauge_with_registry!(
            Opts::new(
                "elector_active_election_id",
                "Currently open election id (0 when none)"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            ticks,
            failed_ticks,
            keys_created,
            stakes_submitted,
            recoveries_submitted,
            entity_failures,
            active_election,
        })
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Metrics(prometheus::Error::Msg(e.to_string())))
    }

    /// Replace `path` with the current exposition. Written to a sibling
    /// temp file first so a scraper never reads a partial file.
    pub fn write_textfile(&self, path: &Path) -> Result<(), NodeError> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render()?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_contains_every_series() {
        let metrics = OrchestratorMetrics::new().unwrap();
        metrics.ticks.inc();
        metrics.active_election.set(51_820_000);
        let text = metrics.render().unwrap();
        assert!(text.contains("elector_ticks_total 1"));
        assert!(text.contains("elector_active_election_id 51820000"));
        assert!(text.contains("elector_entity_failures_total 0"));
    }

    #[test]
    fn textfile_is_replaced_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elector.prom");
        let metrics = OrchestratorMetrics::new().unwrap();
        metrics.write_textfile(&path).unwrap();
        metrics.stakes_submitted.inc();
        metrics.write_textfile(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("elector_stakes_submitted_total 1"));
        assert!(!dir.path().join("elector.prom.tmp").exists());
    }
}
