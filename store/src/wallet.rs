//! Wallet storage trait.

use std::path::PathBuf;

use elector_types::{AccountAddress, Nanotons, Wallet, WalletId};

use crate::{EnabledFilter, StoreError};

/// Wallets are created by an administrator; the orchestrator only reads
/// them and refreshes the cached balance.
pub trait WalletStore {
    /// Insert a new enabled wallet with a zero cached balance.
    fn add_wallet(&self, address: AccountAddress, key_file: PathBuf) -> Result<Wallet, StoreError>;

    fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError>;

    /// Wallets matching `filter`, ordered by id.
    fn list_wallets(&self, filter: EnabledFilter) -> Result<Vec<Wallet>, StoreError>;

    /// Overwrite the cached balance. Fails with `NotFound` for unknown ids.
    fn update_balance(&self, id: WalletId, balance: Nanotons) -> Result<(), StoreError>;

    fn set_wallet_enabled(&self, id: WalletId, enabled: bool) -> Result<(), StoreError>;

    fn delete_wallet(&self, id: WalletId) -> Result<(), StoreError>;
}
