//! [`TxComposer`] over `fift` and the stock smart-contract scripts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use elector_types::{AccountAddress, ElectionId, KeyHandle, MaxFactor, Nanotons, Signature};

use crate::config::FiftConfig;
use crate::error::ToolError;
use crate::parse;
use crate::runner::ToolRunner;
use crate::{BocFile, ElectionRequest, TxComposer};

const ELECTION_REQUEST_FILE: &str = "validator-to-sign.bin";
const SIGNED_REQUEST_FILE: &str = "validator-query.boc";
const RECOVERY_REQUEST_FILE: &str = "recover-query.boc";
// wallet.fif appends `.boc` itself
const WALLET_QUERY_STEM: &str = "wallet-query";

/// Runs every script inside `work_dir`, overwriting one output file per
/// kind of message. Messages are built and submitted one at a time, so a
/// file is always consumed before the next build replaces it.
#[derive(Debug)]
pub struct FiftComposer {
    config: FiftConfig,
    runner: ToolRunner,
}

impl FiftComposer {
    pub fn new(config: FiftConfig, timeout: Duration, verbose: bool) -> Result<Self, ToolError> {
        std::fs::create_dir_all(&config.work_dir)?;
        let runner = ToolRunner::new(timeout)
            .verbose(verbose)
            .in_dir(config.work_dir.clone());
        Ok(Self { config, runner })
    }

    fn script(&self, script: &Path, args: Vec<String>) -> Result<String, ToolError> {
        let mut full = vec![
            "-I".to_string(),
            self.config.lib_path.display().to_string(),
            "-s".to_string(),
            script.display().to_string(),
        ];
        full.extend(args);
        self.runner.run(&self.config.bin, &full)
    }

    /// Saved-file path reported by a script, anchored at the work directory.
    fn saved(&self, output: &str) -> Result<BocFile, ToolError> {
        let reported = PathBuf::from(parse::parse_saved_file(output)?);
        if reported.is_absolute() {
            Ok(BocFile::new(reported))
        } else {
            Ok(BocFile::new(self.config.work_dir.join(reported)))
        }
    }
}

impl TxComposer for FiftComposer {
    fn election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: &KeyHandle,
    ) -> Result<ElectionRequest, ToolError> {
        let out = self.script(
            &self.config.elect_req_fif,
            vec![
                wallet.to_string(),
                election_id.to_string(),
                max_factor.to_string(),
                adnl.to_string(),
                ELECTION_REQUEST_FILE.to_string(),
            ],
        )?;
        parse::parse_election_request(&out)
    }

    fn signed_election_request(
        &self,
        wallet: &AccountAddress,
        election_id: ElectionId,
        max_factor: MaxFactor,
        adnl: &KeyHandle,
        public_key: &KeyHandle,
        signature: &Signature,
    ) -> Result<BocFile, ToolError> {
        let out = self.script(
            &self.config.elect_signed_fif,
            vec![
                wallet.to_string(),
                election_id.to_string(),
                max_factor.to_string(),
                adnl.to_string(),
                public_key.to_string(),
                signature.to_string(),
                SIGNED_REQUEST_FILE.to_string(),
            ],
        )?;
        self.saved(&out)
    }

    fn wallet_transfer(
        &self,
        key_file: &Path,
        destination: &AccountAddress,
        seqno: u32,
        amount: Nanotons,
        body: Option<&BocFile>,
    ) -> Result<BocFile, ToolError> {
        let mut args = vec![
            key_file.display().to_string(),
            destination.to_string(),
            seqno.to_string(),
            amount.to_string(),
        ];
        if let Some(body) = body {
            args.push("-B".to_string());
            args.push(body.path().display().to_string());
        }
        args.push(WALLET_QUERY_STEM.to_string());
        let out = self.script(&self.config.wallet_fif, args)?;
        self.saved(&out)
    }

    fn recovery_request(&self) -> Result<BocFile, ToolError> {
        let out = self.script(
            &self.config.recover_fif,
            vec![RECOVERY_REQUEST_FILE.to_string()],
        )?;
        self.saved(&out)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn composer(dir: &Path, body: &str) -> FiftComposer {
        let bin = dir.join("fift");
        std::fs::write(&bin, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = FiftConfig {
            bin,
            lib_path: dir.join("lib"),
            wallet_fif: dir.join("wallet.fif"),
            recover_fif: dir.join("recover-stake.fif"),
            elect_req_fif: dir.join("validator-elect-req.fif"),
            elect_signed_fif: dir.join("validator-elect-signed.fif"),
            work_dir: dir.join("work"),
        };
        FiftComposer::new(config, Duration::from_secs(5), false).unwrap()
    }

    #[test]
    fn relative_saved_files_resolve_into_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let fift = composer(dir.path(), "echo 'Saved to file recover-query.boc'");
        let boc = fift.recovery_request().unwrap();
        assert_eq!(boc.path(), dir.path().join("work").join("recover-query.boc"));
    }

    #[test]
    fn repeated_transfers_reuse_one_file() {
        let dir = tempfile::tempdir().unwrap();
        // Write the final argument (the save file) and report it back.
        let fift = composer(
            dir.path(),
            r#"for a; do last="$a"; done; echo "$@" > args.txt; touch "$last.boc"; echo "Saved to file $last.boc""#,
        );
        let dest = AccountAddress::new(-1, [0x33; 32]);
        let body = BocFile::new("/tmp/body.boc");
        let first = fift
            .wallet_transfer(Path::new("/keys/w"), &dest, 7, Nanotons::from_coins(1), Some(&body))
            .unwrap();
        let second = fift
            .wallet_transfer(Path::new("/keys/w"), &dest, 8, Nanotons::from_coins(1), None)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path(), dir.path().join("work").join("wallet-query.boc"));

        let args = std::fs::read_to_string(dir.path().join("work").join("args.txt")).unwrap();
        assert!(args.contains(" 8 1.000000000 "));
        assert!(!args.contains("-B"));

        // args.txt and the single query file
        let files = std::fs::read_dir(dir.path().join("work")).unwrap().count();
        assert_eq!(files, 2);
    }

    #[test]
    fn missing_banner_is_unexpected_output() {
        let dir = tempfile::tempdir().unwrap();
        let fift = composer(dir.path(), "echo 'error: bad address'");
        let err = fift
            .election_request(
                &AccountAddress::new(-1, [1; 32]),
                ElectionId::new(100),
                MaxFactor::new(2.7).unwrap(),
                &KeyHandle::new("ADNL"),
            )
            .unwrap_err();
        assert!(matches!(err, ToolError::UnexpectedOutput { tool: "fift", .. }));
    }
}
