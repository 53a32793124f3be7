//! Nullable transaction composer.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use elector_toolchain::{BocFile, ElectionRequest, ToolError, TxComposer};
use elector_types::{AccountAddress, ElectionId, KeyHandle, MaxFactor, Nanotons, Signature};

use crate::injected;

/// One recorded composer request.
#[derive(Clone, Debug, PartialEq)]
pub enum ComposerCall {
    ElectionRequest {
        wallet: AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: KeyHandle,
    },
    SignedElectionRequest {
        wallet: AccountAddress,
        election_id: ElectionId,
        public_key: KeyHandle,
        signature: Signature,
    },
    WalletTransfer {
        key_file: PathBuf,
        destination: AccountAddress,
        seqno: u32,
        amount: Nanotons,
        body: Option<BocFile>,
    },
    RecoveryRequest,
}

#[derive(Default)]
struct ComposerState {
    built: u64,
    calls: Vec<ComposerCall>,
    fail: bool,
}

/// A [`TxComposer`] that returns numbered placeholder files and records
/// what it was asked to build.
#[derive(Default)]
pub struct NullComposer {
    state: Mutex<ComposerState>,
}

impl NullComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn calls(&self) -> Vec<ComposerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// `(seqno, amount, had_body)` of every wallet transfer, in order.
    pub fn transfers(&self) -> Vec<(u32, Nanotons, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ComposerCall::WalletTransfer {
                    seqno,
                    amount,
                    body,
                    ..
                } => Some((seqno, amount, body.is_some())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ComposerCall, stem: &str) -> Result<BocFile, ToolError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.fail {
            return Err(injected("fift"));
        }
        state.built += 1;
        Ok(BocFile::new(format!("{stem}-{}.boc", state.built)))
    }
}

impl TxComposer for NullComposer {
    fn election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: &KeyHandle,
    ) -> Result<ElectionRequest, ToolError> {
        self.record(
            ComposerCall::ElectionRequest {
                wallet: *wallet,
                election_id,
                max_factor,
                adnl: adnl.clone(),
            },
            "request",
        )?;
        Ok(ElectionRequest::new(format!("{:016x}", election_id.as_u64())))
    }

    fn signed_election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        _max_factor: MaxFactor,
        _adnl: &KeyHandle,
        public_key: &KeyHandle,
        signature: &Signature,
    ) -> Result<BocFile, ToolError> {
        self.record(
            ComposerCall::SignedElectionRequest {
                wallet: *wallet,
                election_id,
                public_key: public_key.clone(),
                signature: signature.clone(),
            },
            "validator-query",
        )
    }

    fn wallet_transfer(
        &self,
        key_file: &Path,
        destination: &AccountAddress,
        seqno: u32,
        amount: Nanotons,
        body: Option<&BocFile>,
    ) -> Result<BocFile, ToolError> {
        self.record(
            ComposerCall::WalletTransfer {
                key_file: key_file.to_path_buf(),
                destination: *destination,
                seqno,
                amount,
                body: body.cloned(),
            },
            "wallet-query",
        )
    }

    fn recovery_request(&self) -> Result<BocFile, ToolError> {
        self.record(ComposerCall::RecoveryRequest, "recover-query")
    }
}
