//! Abstract ledger traits for the elector bot.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The orchestrator depends only on the traits, and every
//! idempotency decision it makes is re-derived from reads through them.

pub mod election;
pub mod error;
pub mod key;
pub mod meta;
pub mod node;
pub mod participation;
pub mod wallet;

pub use election::ElectionStore;
pub use error::StoreError;
pub use key::KeyStore;
pub use meta::MetaStore;
pub use node::{NewNode, NodeStore};
pub use participation::ParticipationStore;
pub use wallet::WalletStore;

use serde::{Deserialize, Serialize};

/// Filter for listing wallets and nodes by their enabled flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnabledFilter {
    #[default]
    Enabled,
    Disabled,
    All,
}

impl EnabledFilter {
    pub fn matches(&self, enabled: bool) -> bool {
        match self {
            EnabledFilter::Enabled => enabled,
            EnabledFilter::Disabled => !enabled,
            EnabledFilter::All => true,
        }
    }
}

/// The full ledger the orchestrator works against.
pub trait Ledger:
    WalletStore + NodeStore + ElectionStore + KeyStore + ParticipationStore + Send + Sync
{
}

impl<T> Ledger for T where
    T: WalletStore + NodeStore + ElectionStore + KeyStore + ParticipationStore + Send + Sync
{
}
