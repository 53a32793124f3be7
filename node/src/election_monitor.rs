//! Election Monitor: tracks the open election and persists its window once.

use std::sync::Arc;

use tracing::{debug, info};

use elector_store::{ElectionStore, Ledger};
use elector_toolchain::ChainQuery;
use elector_types::{AccountAddress, ElectionId, ElectionWindow};

use crate::NodeError;

pub struct ElectionMonitor {
    ledger: Arc<dyn Ledger>,
    chain: Arc<dyn ChainQuery>,
}

impl ElectionMonitor {
    pub fn new(ledger: Arc<dyn Ledger>, chain: Arc<dyn ChainQuery>) -> Self {
        Self { ledger, chain }
    }

    /// The window of the election the elector currently accepts bids for.
    ///
    /// The first time an election id is seen its window is derived from the
    /// network timing parameters and stored; afterwards the stored window is
    /// returned as is, even if the parameters have changed since. Nothing is
    /// written when a chain query fails.
    pub fn resolve(&self, elector: &AccountAddress) -> Result<Option<ElectionWindow>, NodeError> {
        let raw = self.chain.active_election_id(elector)?;
        let Some(election_id) = ElectionId::from_active(raw) else {
            debug!("no active election");
            return Ok(None);
        };

        if let Some(window) = self.ledger.get_election(election_id)? {
            debug!(election = %election_id, "election known");
            return Ok(Some(window));
        }

        let timing = self.chain.election_timing()?;
        let window = ElectionWindow::derive(election_id, &timing);
        self.ledger.add_election(&window)?;
        info!(
            election = %election_id,
            start_at = window.start_at,
            close_at = window.close_at,
            next_elections_at = window.next_elections_at,
            "new election"
        );
        Ok(Some(window))
    }
}
