//! LMDB ledger backend for the elector bot.
//!
//! Implements all ledger traits from `elector-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database inside a single
//! environment; records are bincode-encoded and keyed by big-endian ids so
//! iteration order matches id order.

mod codec;
pub mod election;
pub mod environment;
pub mod error;
pub mod key;
pub mod meta;
pub mod migration;
pub mod node;
pub mod participation;
pub mod wallet;

pub use environment::{LmdbStore, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
