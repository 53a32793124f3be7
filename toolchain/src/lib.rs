//! Interfaces to the external systems the orchestrator drives.
//!
//! - [`ChainQuery`]: read-only chain state plus message submission
//! - [`NodeConsole`]: key generation, signing and key registration on a node
//! - [`TxComposer`]: builds signed election and wallet messages
//!
//! The traits are the seams; [`LiteClient`], [`ValidatorConsole`] and
//! [`FiftComposer`] implement them on top of the standard command-line
//! tools, and the nullables crate provides in-memory doubles.

pub mod config;
pub mod console;
pub mod error;
pub mod fift;
pub mod lite_client;
pub mod parse;
pub mod runner;

pub use config::{ConsoleConfig, FiftConfig, LiteClientConfig};
pub use console::ValidatorConsole;
pub use error::ToolError;
pub use fift::FiftComposer;
pub use lite_client::LiteClient;
pub use runner::ToolRunner;

use std::path::{Path, PathBuf};

use elector_types::{
    AccountAddress, ElectionId, ElectionTiming, KeyHandle, MaxFactor, Nanotons, Node, Signature,
    StakeBounds,
};

/// Unsigned election request payload (hex) that the validator must sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionRequest(String);

impl ElectionRequest {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A serialized message on disk, ready to be sent or embedded as a body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BocFile(PathBuf);

impl BocFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Clock readings reported by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeStats {
    pub unixtime: u64,
    pub masterchain_block_time: u64,
}

impl NodeStats {
    /// Seconds the node's last masterchain block trails its wall clock.
    pub fn lag_secs(&self) -> u64 {
        self.unixtime.saturating_sub(self.masterchain_block_time)
    }
}

/// Read-only view of chain state, plus submission of prepared messages.
pub trait ChainQuery: Send + Sync {
    /// Elector contract address (config param 1).
    fn elector_address(&self) -> Result<AccountAddress, ToolError>;

    /// Raw active election id; 0 when no election is open.
    fn active_election_id(&self, elector: &AccountAddress) -> Result<u64, ToolError>;

    /// Election timing parameters (config param 15).
    fn election_timing(&self) -> Result<ElectionTiming, ToolError>;

    /// Stake limits (config param 17).
    fn stake_bounds(&self) -> Result<StakeBounds, ToolError>;

    fn account_balance(&self, account: &AccountAddress) -> Result<Nanotons, ToolError>;

    /// Next sequence number the wallet contract will accept.
    fn wallet_seqno(&self, wallet: &AccountAddress) -> Result<u32, ToolError>;

    /// Stake already lodged with the elector for this validator public key
    /// (hex); zero when not participating.
    fn staked_amount(
        &self,
        elector: &AccountAddress,
        public_key_hex: &str,
    ) -> Result<Nanotons, ToolError>;

    /// Frozen stake plus bonuses the elector would return to the account
    /// whose address hash is `account_hash_hex`.
    fn claimable_reward(
        &self,
        elector: &AccountAddress,
        account_hash_hex: &str,
    ) -> Result<Nanotons, ToolError>;

    fn submit(&self, message: &BocFile) -> Result<(), ToolError>;
}

/// Administrative console of one validator node.
pub trait NodeConsole: Send + Sync {
    fn create_key(&self, node: &Node) -> Result<KeyHandle, ToolError>;

    fn export_public_key(&self, node: &Node, key: &KeyHandle) -> Result<KeyHandle, ToolError>;

    fn sign(
        &self,
        node: &Node,
        key: &KeyHandle,
        request: &ElectionRequest,
    ) -> Result<Signature, ToolError>;

    fn add_permanent_key(
        &self,
        node: &Node,
        key: &KeyHandle,
        election_id: ElectionId,
        expire_at: u64,
    ) -> Result<(), ToolError>;

    fn add_temporary_key(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        key: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError>;

    fn add_adnl(&self, node: &Node, key: &KeyHandle, category: u32) -> Result<(), ToolError>;

    fn add_validator_address(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        adnl: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError>;

    fn stats(&self, node: &Node) -> Result<NodeStats, ToolError>;
}

/// Builds the messages the orchestrator submits.
pub trait TxComposer: Send + Sync {
    /// Unsigned payload binding wallet, election, max factor and ADNL key.
    fn election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: &KeyHandle,
    ) -> Result<ElectionRequest, ToolError>;

    /// Message body for the elector carrying the node's signature.
    fn signed_election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: &KeyHandle,
        public_key: &KeyHandle,
        signature: &Signature,
    ) -> Result<BocFile, ToolError>;

    /// External message moving `amount` from the wallet to `destination`,
    /// optionally carrying `body`.
    fn wallet_transfer(
        &self,
        key_file: &Path,
        destination: &AccountAddress,
        seqno: u32,
        amount: Nanotons,
        body: Option<&BocFile>,
    ) -> Result<BocFile, ToolError>;

    /// Message body asking the elector to return frozen stakes and rewards.
    fn recovery_request(&self) -> Result<BocFile, ToolError>;
}
