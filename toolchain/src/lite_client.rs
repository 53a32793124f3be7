//! [`ChainQuery`] over the `lite-client` binary.

use std::time::Duration;

use elector_types::{AccountAddress, ElectionTiming, Nanotons, StakeBounds};

use crate::config::LiteClientConfig;
use crate::error::ToolError;
use crate::parse;
use crate::runner::ToolRunner;
use crate::{BocFile, ChainQuery};

/// Each query is a fresh `lite-client -c <command>` process.
#[derive(Clone, Debug)]
pub struct LiteClient {
    config: LiteClientConfig,
    runner: ToolRunner,
}

impl LiteClient {
    pub fn new(config: LiteClientConfig, timeout: Duration, verbose: bool) -> Self {
        Self {
            config,
            runner: ToolRunner::new(timeout).verbose(verbose),
        }
    }

    fn args(&self, command: &str) -> Vec<String> {
        vec![
            "-C".to_string(),
            self.config.config.display().to_string(),
            "-v".to_string(),
            "0".to_string(),
            "-c".to_string(),
            command.to_string(),
        ]
    }

    fn exec(&self, command: &str) -> Result<String, ToolError> {
        self.runner.run(&self.config.bin, &self.args(command))
    }

    fn run_method(
        &self,
        account: &AccountAddress,
        method: &str,
        params: &[&str],
    ) -> Result<u64, ToolError> {
        let mut command = format!("runmethod {account} {method}");
        for p in params {
            command.push(' ');
            command.push_str(p);
        }
        parse::parse_runmethod_result(&self.exec(&command)?)
    }
}

impl ChainQuery for LiteClient {
    fn elector_address(&self) -> Result<AccountAddress, ToolError> {
        parse::parse_elector_address(&self.exec("getconfig 1")?)
    }

    fn active_election_id(&self, elector: &AccountAddress) -> Result<u64, ToolError> {
        self.run_method(elector, "active_election_id", &[])
    }

    fn election_timing(&self) -> Result<ElectionTiming, ToolError> {
        parse::parse_election_timing(&self.exec("getconfig 15")?)
    }

    fn stake_bounds(&self) -> Result<StakeBounds, ToolError> {
        parse::parse_stake_bounds(&self.exec("getconfig 17")?)
    }

    fn account_balance(&self, account: &AccountAddress) -> Result<Nanotons, ToolError> {
        parse::parse_account_balance(&self.exec(&format!("getaccount {account}"))?)
    }

    fn wallet_seqno(&self, wallet: &AccountAddress) -> Result<u32, ToolError> {
        let seqno = self.run_method(wallet, "seqno", &[])?;
        u32::try_from(seqno).map_err(|_| {
            ToolError::unexpected("lite-client", "32-bit seqno", &seqno.to_string())
        })
    }

    fn staked_amount(
        &self,
        elector: &AccountAddress,
        public_key_hex: &str,
    ) -> Result<Nanotons, ToolError> {
        let arg = format!("0x{public_key_hex}");
        self.run_method(elector, "participates_in", &[&arg])
            .map(Nanotons::new)
    }

    fn claimable_reward(
        &self,
        elector: &AccountAddress,
        account_hash_hex: &str,
    ) -> Result<Nanotons, ToolError> {
        let arg = format!("0x{account_hash_hex}");
        self.run_method(elector, "compute_returned_stake", &[&arg])
            .map(Nanotons::new)
    }

    fn submit(&self, message: &BocFile) -> Result<(), ToolError> {
        let out = self.exec(&format!("sendfile {}", message.path().display()))?;
        parse::expect_sent(&out)
    }
}
