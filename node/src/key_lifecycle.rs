//! Key Lifecycle Manager.
//!
//! Makes sure a node holds a signing key (registered as permanent and
//! temporary key), its exported public key and an ADNL key (registered as
//! the validator address) for an election. Every step first consults the
//! ledger, so running [`KeyLifecycle::ensure_keys`] again after a complete
//! run sends nothing to the node.
//!
//! Key records are written as soon as a key exists on the node and never
//! change. Whether its registration went through is tracked separately: a
//! key that exists but is not marked registered is registered again on the
//! next run instead of being replaced.

use std::sync::Arc;

use tracing::{debug, info};

use elector_store::{KeyStore, Ledger};
use elector_toolchain::{ChainQuery, NodeConsole};
use elector_types::{
    AccountAddress, ElectionId, ElectionWindow, KeyHandle, KeyRecord, KeyType, Nanotons, Node,
};

use crate::metrics::OrchestratorMetrics;
use crate::NodeError;

/// Lifetime of the permanent key registration, from the election id.
pub const PERMANENT_KEY_TTL: u64 = 70_000;
/// Extra lifetime of the temporary key past the validation term.
pub const TEMPORARY_KEY_GRACE: u64 = 10_000;
/// Lifetime of the validator address registration, from the election id.
pub const VALIDATOR_ADDRESS_TTL: u64 = 70_000;
/// ADNL category the validator address is published under.
pub const ADNL_CATEGORY: u32 = 0;

/// The three handles a bid needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorKeys {
    pub signing: KeyHandle,
    pub public: KeyHandle,
    pub adnl: KeyHandle,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keys are in place; the node may bid.
    Ready(ValidatorKeys),
    /// The elector already holds a stake for this node's public key.
    AlreadyStaked { amount: Nanotons },
}

pub struct KeyLifecycle {
    ledger: Arc<dyn Ledger>,
    chain: Arc<dyn ChainQuery>,
    console: Arc<dyn NodeConsole>,
    metrics: Arc<OrchestratorMetrics>,
}

impl KeyLifecycle {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        chain: Arc<dyn ChainQuery>,
        console: Arc<dyn NodeConsole>,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            ledger,
            chain,
            console,
            metrics,
        }
    }

    pub fn ensure_keys(
        &self,
        node: &Node,
        window: &ElectionWindow,
        elector: &AccountAddress,
    ) -> Result<KeyOutcome, NodeError> {
        let election = window.election_id;

        let signing = self.existing_or_new(node, election, KeyType::Signing)?;
        if !self.ledger.is_registered(node.id, election, KeyType::Signing)? {
            self.register_signing(node, election, &signing)?;
            self.ledger
                .mark_registered(node.id, election, KeyType::Signing)?;
        }

        let public = match self.ledger.get_key(node.id, election, KeyType::Public)? {
            Some(record) => record.handle,
            None => {
                let handle = self.console.export_public_key(node, &signing)?;
                self.store(node, election, KeyType::Public, &handle)?;
                handle
            }
        };

        let public_hex = public.public_key_hex()?;
        let staked = self.chain.staked_amount(elector, &public_hex)?;
        if !staked.is_zero() {
            info!(public_key = %public_hex, stake = %staked, "already participating");
            return Ok(KeyOutcome::AlreadyStaked { amount: staked });
        }

        let adnl = self.existing_or_new(node, election, KeyType::Adnl)?;
        if !self.ledger.is_registered(node.id, election, KeyType::Adnl)? {
            self.console.add_adnl(node, &adnl, ADNL_CATEGORY)?;
            self.console.add_validator_address(
                node,
                &signing,
                &adnl,
                election.offset(VALIDATOR_ADDRESS_TTL),
            )?;
            self.ledger.mark_registered(node.id, election, KeyType::Adnl)?;
            info!(adnl = %adnl, "validator address registered");
        }

        Ok(KeyOutcome::Ready(ValidatorKeys {
            signing,
            public,
            adnl,
        }))
    }

    /// Stored handle of `key_type`, or a fresh key created on the node and
    /// stored before anything else happens to it.
    fn existing_or_new(
        &self,
        node: &Node,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<KeyHandle, NodeError> {
        if let Some(record) = self.ledger.get_key(node.id, election, key_type)? {
            debug!(key_type = %key_type, key = %record.handle, "key loaded");
            return Ok(record.handle);
        }
        let handle = self.console.create_key(node)?;
        self.store(node, election, key_type, &handle)?;
        self.metrics.keys_created.inc();
        info!(key_type = %key_type, key = %handle, "key created");
        Ok(handle)
    }

    fn store(
        &self,
        node: &Node,
        election: ElectionId,
        key_type: KeyType,
        handle: &KeyHandle,
    ) -> Result<(), NodeError> {
        self.ledger.add_key(&KeyRecord {
            node_id: node.id,
            election_id: election,
            key_type,
            handle: handle.clone(),
        })?;
        Ok(())
    }

    fn register_signing(
        &self,
        node: &Node,
        election: ElectionId,
        signing: &KeyHandle,
    ) -> Result<(), NodeError> {
        // read here, not per run: only registration needs the term length
        let elected_for = self.chain.election_timing()?.validators_elected_for;
        let permanent_expiry = election.offset(PERMANENT_KEY_TTL);
        let temporary_expiry = election.offset(elected_for.saturating_add(TEMPORARY_KEY_GRACE));

        self.console
            .add_permanent_key(node, signing, election, permanent_expiry)?;
        self.console
            .add_temporary_key(node, signing, signing, temporary_expiry)?;
        info!(
            key = %signing,
            permanent_expiry,
            temporary_expiry,
            "signing key registered"
        );
        Ok(())
    }
}
