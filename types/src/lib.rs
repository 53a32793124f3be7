//! Fundamental types for the elector participation bot.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: addresses, amounts, election ids and windows, key handles and
//! the records kept in the ledger.

pub mod address;
pub mod amount;
pub mod election;
pub mod error;
pub mod keys;
pub mod records;
pub mod time;

pub use address::AccountAddress;
pub use amount::{Nanotons, NANOS_PER_COIN};
pub use election::{ElectionId, ElectionTiming, ElectionWindow, StakeBounds};
pub use error::ParseError;
pub use keys::{KeyHandle, KeyType, MaxFactor, Signature};
pub use records::{KeyRecord, Node, NodeId, Participation, Wallet, WalletId};
pub use time::Timestamp;
