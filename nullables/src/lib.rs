//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external dependency of the orchestrator (clock, pacing, ledger,
//! chain, node console, transaction composer) sits behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return scripted, deterministic values
//! - Record every call for later assertions
//! - Fail on demand
//! - Never touch the filesystem, a node or the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod composer;
pub mod console;
pub mod store;

pub use chain::NullChain;
pub use clock::{NullClock, NullPacer};
pub use composer::{ComposerCall, NullComposer};
pub use console::{ConsoleCall, NullConsole};
pub use store::NullLedger;

use elector_toolchain::ToolError;

/// The error every nullable returns when told to fail.
pub(crate) fn injected(tool: &str) -> ToolError {
    ToolError::Failed {
        tool: tool.to_string(),
        status: "exit status: 1".to_string(),
        output: "injected failure".to_string(),
    }
}
