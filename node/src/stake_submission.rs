//! Stake Submission Pipeline: composes, signs and submits one bid.

use std::sync::Arc;

use tracing::info;

use elector_store::{Ledger, ParticipationStore};
use elector_toolchain::{ChainQuery, NodeConsole, TxComposer};
use elector_types::{
    AccountAddress, ElectionId, MaxFactor, Nanotons, Node, NodeId, Participation, Timestamp, Wallet,
};
use elector_utils::Clock;

use crate::key_lifecycle::ValidatorKeys;
use crate::metrics::OrchestratorMetrics;
use crate::NodeError;

/// What every bid carries, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StakePolicy {
    pub amount: Nanotons,
    pub max_factor: MaxFactor,
    /// Seconds during which a recorded bid counts as still in flight.
    pub resubmit_after_secs: u64,
}

pub struct StakeSubmission {
    ledger: Arc<dyn Ledger>,
    chain: Arc<dyn ChainQuery>,
    console: Arc<dyn NodeConsole>,
    composer: Arc<dyn TxComposer>,
    clock: Arc<dyn Clock>,
    metrics: Arc<OrchestratorMetrics>,
    policy: StakePolicy,
}

impl StakeSubmission {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        chain: Arc<dyn ChainQuery>,
        console: Arc<dyn NodeConsole>,
        composer: Arc<dyn TxComposer>,
        clock: Arc<dyn Clock>,
        metrics: Arc<OrchestratorMetrics>,
        policy: StakePolicy,
    ) -> Self {
        Self {
            ledger,
            chain,
            console,
            composer,
            clock,
            metrics,
            policy,
        }
    }

    /// Time of a recorded bid for this node and election that is younger
    /// than the resubmission grace period, if any.
    ///
    /// The chain only shows a stake once the transfer has been processed,
    /// so a bid sent moments ago still reads as zero there.
    pub fn in_flight(
        &self,
        node: NodeId,
        election: ElectionId,
    ) -> Result<Option<Timestamp>, NodeError> {
        let now = self.clock.now();
        let latest = self
            .ledger
            .participations(node, election)?
            .into_iter()
            .map(|p| p.submitted_at)
            .max();
        Ok(latest.filter(|at| !at.has_expired(self.policy.resubmit_after_secs, now)))
    }

    /// Build and send the bid of `node` for `election`, paid from `wallet`.
    ///
    /// The participation record is written only after the chain accepted
    /// the message. Any failure leaves the ledger as it was.
    pub fn submit(
        &self,
        wallet: &Wallet,
        node: &Node,
        election: ElectionId,
        keys: &ValidatorKeys,
        elector: &AccountAddress,
    ) -> Result<Participation, NodeError> {
        let StakePolicy {
            amount, max_factor, ..
        } = self.policy;

        let request =
            self.composer
                .election_request(&wallet.address, election, max_factor, &keys.adnl)?;
        let signature = self.console.sign(node, &keys.signing, &request)?;
        let signed = self.composer.signed_election_request(
            &wallet.address,
            election,
            max_factor,
            &keys.adnl,
            &keys.public,
            &signature,
        )?;

        // Read right before use: every transfer consumes one seqno.
        let seqno = self.chain.wallet_seqno(&wallet.address)?;
        let transfer =
            self.composer
                .wallet_transfer(&wallet.key_file, elector, seqno, amount, Some(&signed))?;
        self.chain.submit(&transfer)?;

        let participation = Participation {
            node_id: node.id,
            election_id: election,
            stake_amount: amount,
            max_factor,
            submitted_at: self.clock.now(),
        };
        self.ledger.add_participation(&participation)?;
        self.metrics.stakes_submitted.inc();
        info!(stake = %amount, %max_factor, seqno, "stake submitted");
        Ok(participation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elector_nullables::{ComposerCall, NullChain, NullClock, NullComposer, NullConsole, NullLedger};
    use elector_types::{KeyHandle, WalletId};
    use std::path::PathBuf;

    struct Harness {
        ledger: Arc<NullLedger>,
        chain: Arc<NullChain>,
        composer: Arc<NullComposer>,
        clock: Arc<NullClock>,
        stakes: StakeSubmission,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(NullLedger::new());
        let chain = Arc::new(NullChain::new());
        let console = Arc::new(NullConsole::new());
        let composer = Arc::new(NullComposer::new());
        let clock = Arc::new(NullClock::new(1_000));
        let stakes = StakeSubmission::new(
            ledger.clone(),
            chain.clone(),
            console,
            composer.clone(),
            clock.clone(),
            Arc::new(OrchestratorMetrics::new().unwrap()),
            StakePolicy {
                amount: Nanotons::from_coins(20_000),
                max_factor: MaxFactor::DEFAULT,
                resubmit_after_secs: 900,
            },
        );
        Harness {
            ledger,
            chain,
            composer,
            clock,
            stakes,
        }
    }

    fn wallet() -> Wallet {
        Wallet {
            id: WalletId(1),
            address: AccountAddress::new(0, [7; 32]),
            key_file: PathBuf::from("/keys/wallet"),
            balance: Nanotons::from_coins(50_000),
            enabled: true,
        }
    }

    fn node() -> Node {
        Node {
            id: NodeId(3),
            wallet_id: WalletId(1),
            host_port: "10.0.0.3:3030".into(),
            server_pub: PathBuf::from("server.pub"),
            client_cert: PathBuf::from("client"),
            enabled: true,
        }
    }

    fn keys() -> ValidatorKeys {
        ValidatorKeys {
            signing: KeyHandle::new("SIGN"),
            public: NullConsole::public_key_of(&KeyHandle::new("SIGN")),
            adnl: KeyHandle::new("ADNL"),
        }
    }

    #[test]
    fn bid_is_built_signed_sent_and_recorded() {
        let h = harness();
        let election = ElectionId::new(1_000_000);
        h.chain.set_seqno(wallet().address, 12);

        let p = h
            .stakes
            .submit(&wallet(), &node(), election, &keys(), &NullChain::ELECTOR)
            .unwrap();
        assert_eq!(p.stake_amount, Nanotons::from_coins(20_000));
        assert_eq!(p.submitted_at, Timestamp::new(1_000));
        assert_eq!(h.ledger.participations(NodeId(3), election).unwrap(), vec![p]);

        let calls = h.composer.calls();
        assert!(matches!(calls[0], ComposerCall::ElectionRequest { .. }));
        assert!(matches!(
            &calls[1],
            ComposerCall::SignedElectionRequest { signature, .. } if signature.as_str() == "SIG-SIGN"
        ));
        assert_eq!(
            h.composer.transfers(),
            vec![(12, Nanotons::from_coins(20_000), true)]
        );
        assert_eq!(h.chain.submitted().len(), 1);
    }

    #[test]
    fn failed_submit_writes_no_participation() {
        let h = harness();
        h.chain.fail_method("submit");
        let election = ElectionId::new(1_000_000);
        assert!(h
            .stakes
            .submit(&wallet(), &node(), election, &keys(), &NullChain::ELECTOR)
            .is_err());
        assert!(h.ledger.participations(NodeId(3), election).unwrap().is_empty());
    }

    #[test]
    fn recent_bid_is_in_flight_until_grace_expires() {
        let h = harness();
        let election = ElectionId::new(1_000_000);
        assert_eq!(h.stakes.in_flight(NodeId(3), election).unwrap(), None);

        h.stakes
            .submit(&wallet(), &node(), election, &keys(), &NullChain::ELECTOR)
            .unwrap();
        h.clock.advance(899);
        assert_eq!(
            h.stakes.in_flight(NodeId(3), election).unwrap(),
            Some(Timestamp::new(1_000))
        );
        h.clock.advance(1);
        assert_eq!(h.stakes.in_flight(NodeId(3), election).unwrap(), None);
    }
}
