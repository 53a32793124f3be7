//! Keeps the cached wallet balances in the ledger in line with the chain.

use std::sync::Arc;

use tracing::{debug, info, warn};

use elector_store::{EnabledFilter, Ledger, WalletStore};
use elector_toolchain::ChainQuery;
use elector_types::{Nanotons, Wallet};

use crate::NodeError;

pub struct BalanceSync {
    ledger: Arc<dyn Ledger>,
    chain: Arc<dyn ChainQuery>,
}

impl BalanceSync {
    pub fn new(ledger: Arc<dyn Ledger>, chain: Arc<dyn ChainQuery>) -> Self {
        Self { ledger, chain }
    }

    /// Read the on-chain balance of `wallet` and store it when it differs
    /// from the cached one. Returns the on-chain balance.
    pub fn sync(&self, wallet: &Wallet) -> Result<Nanotons, NodeError> {
        let balance = self.chain.account_balance(&wallet.address)?;
        if balance == wallet.balance {
            debug!(balance = %balance, "balance unchanged");
            return Ok(balance);
        }

        let delta = if balance > wallet.balance {
            format!("+{}", balance.saturating_sub(wallet.balance))
        } else {
            format!("-{}", wallet.balance.saturating_sub(balance))
        };
        self.ledger.update_balance(wallet.id, balance)?;
        info!(balance = %balance, %delta, "balance updated");
        Ok(balance)
    }

    /// Sync every enabled wallet. A wallet whose balance cannot be read is
    /// skipped; ledger failures abort. Returns how many wallets were synced.
    pub fn sync_all(&self) -> Result<usize, NodeError> {
        let mut synced = 0;
        for wallet in self.ledger.list_wallets(EnabledFilter::Enabled)? {
            match self.sync(&wallet) {
                Ok(_) => synced += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(wallet = %wallet.id, error = %e, "balance sync failed"),
            }
        }
        Ok(synced)
    }
}
