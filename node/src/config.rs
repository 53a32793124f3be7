//! Bot configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use elector_toolchain::{ConsoleConfig, FiftConfig, LiteClientConfig};
use elector_types::{MaxFactor, Nanotons};
use elector_utils::LogFormat;

use crate::NodeError;

/// Configuration for the elector bot.
///
/// Can be loaded from a TOML file via [`ElectorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). The daemon layers CLI flags on
/// top of whatever the file provides.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectorConfig {
    /// Data directory for the ledger.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between orchestrator ticks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Pause after each chain submission before touching the next node.
    #[serde(default = "default_submission_cooldown")]
    pub submission_cooldown_secs: u64,

    /// Stake sent with every bid, in whole coins.
    #[serde(default = "default_stake_amount")]
    pub stake_amount: u64,

    #[serde(default = "default_max_factor")]
    pub max_factor: MaxFactor,

    /// A bid recorded less than this many seconds ago is assumed to still
    /// be in flight and is not repeated.
    #[serde(default = "default_resubmit_after")]
    pub resubmit_after_secs: u64,

    /// Masterchain lag above which a node is reported as out of sync.
    #[serde(default = "default_max_node_lag")]
    pub max_node_lag_secs: u64,

    /// Prometheus textfile written after every tick.
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,

    /// Deadline for a single external tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    /// Log every tool command line and its output at debug level.
    #[serde(default)]
    pub verbose_tools: bool,

    #[serde(default)]
    pub lite_client: LiteClientConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub fift: FiftConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./elector_data")
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_submission_cooldown() -> u64 {
    10
}

fn default_stake_amount() -> u64 {
    20_000
}

fn default_max_factor() -> MaxFactor {
    MaxFactor::DEFAULT
}

fn default_resubmit_after() -> u64 {
    900
}

fn default_max_node_lag() -> u64 {
    25
}

fn default_tool_timeout() -> u64 {
    60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ElectorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.stake_amount == 0 {
            return Err(NodeError::Config("stake_amount must be positive".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(NodeError::Config("poll_interval_secs must be positive".into()));
        }
        if self.tool_timeout_secs == 0 {
            return Err(NodeError::Config("tool_timeout_secs must be positive".into()));
        }
        if self.max_factor.value() < 1.0 {
            return Err(NodeError::Config("max_factor must be at least 1.0".into()));
        }
        Ok(())
    }

    pub fn stake(&self) -> Nanotons {
        Nanotons::from_coins(self.stake_amount)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn submission_cooldown(&self) -> Duration {
        Duration::from_secs(self.submission_cooldown_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

impl Default for ElectorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval(),
            submission_cooldown_secs: default_submission_cooldown(),
            stake_amount: default_stake_amount(),
            max_factor: default_max_factor(),
            resubmit_after_secs: default_resubmit_after(),
            max_node_lag_secs: default_max_node_lag(),
            metrics_file: None,
            tool_timeout_secs: default_tool_timeout(),
            verbose_tools: false,
            lite_client: LiteClientConfig::default(),
            console: ConsoleConfig::default(),
            fift: FiftConfig::default(),
        }
    }
}
