//! Reward Recovery: claims stakes and rewards the elector is ready to
//! return to a wallet.

use std::sync::Arc;

use tracing::{debug, info};

use elector_toolchain::{ChainQuery, TxComposer};
use elector_types::{AccountAddress, Nanotons, Wallet};

use crate::metrics::OrchestratorMetrics;
use crate::NodeError;

/// Value attached to a recovery transfer. The elector bounces the
/// returned stake together with it.
pub const RECOVERY_TRANSFER_COINS: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryOutcome {
    NothingDue,
    Submitted { amount: Nanotons },
}

impl RecoveryOutcome {
    pub fn submitted(&self) -> bool {
        matches!(self, RecoveryOutcome::Submitted { .. })
    }
}

pub struct RewardRecovery {
    chain: Arc<dyn ChainQuery>,
    composer: Arc<dyn TxComposer>,
    metrics: Arc<OrchestratorMetrics>,
}

impl RewardRecovery {
    pub fn new(
        chain: Arc<dyn ChainQuery>,
        composer: Arc<dyn TxComposer>,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            chain,
            composer,
            metrics,
        }
    }

    /// Send a recovery request from `wallet` when the elector holds a
    /// claimable amount for it. Nothing is recorded in the ledger: once
    /// claimed, the elector reports zero and the next run is a no-op.
    pub fn recover_if_due(
        &self,
        wallet: &Wallet,
        elector: &AccountAddress,
    ) -> Result<RecoveryOutcome, NodeError> {
        let due = self
            .chain
            .claimable_reward(elector, &wallet.address.hash_hex())?;
        if due.is_zero() {
            debug!("no reward due");
            return Ok(RecoveryOutcome::NothingDue);
        }

        let body = self.composer.recovery_request()?;
        let seqno = self.chain.wallet_seqno(&wallet.address)?;
        let transfer = self.composer.wallet_transfer(
            &wallet.key_file,
            elector,
            seqno,
            Nanotons::from_coins(RECOVERY_TRANSFER_COINS),
            Some(&body),
        )?;
        self.chain.submit(&transfer)?;

        self.metrics.recoveries_submitted.inc();
        info!(amount = %due, seqno, "reward recovery submitted");
        Ok(RecoveryOutcome::Submitted { amount: due })
    }
}
