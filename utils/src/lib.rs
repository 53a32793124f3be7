//! Shared utilities for the elector bot.

pub mod logging;
pub mod pacing;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use pacing::{Clock, Pacer, SystemClock, ThreadPacer};
pub use time::format_duration;
