//! Locations of the command-line tools and their support files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteClientConfig {
    pub bin: PathBuf,
    /// Network config JSON (global config) passed with `-C`.
    pub config: PathBuf,
}

impl Default for LiteClientConfig {
    fn default() -> Self {
        Self {
            bin: PathBuf::from("lite-client"),
            config: PathBuf::from("/etc/ton/global.config.json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub bin: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bin: PathBuf::from("validator-engine-console"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiftConfig {
    pub bin: PathBuf,
    /// Fift library directory (`-I`).
    pub lib_path: PathBuf,
    pub wallet_fif: PathBuf,
    pub recover_fif: PathBuf,
    pub elect_req_fif: PathBuf,
    pub elect_signed_fif: PathBuf,
    /// Scratch directory for generated message files.
    pub work_dir: PathBuf,
}

impl Default for FiftConfig {
    fn default() -> Self {
        let smartcont = PathBuf::from("/usr/share/ton/smartcont");
        Self {
            bin: PathBuf::from("fift"),
            lib_path: PathBuf::from("/usr/lib/fift"),
            wallet_fif: smartcont.join("wallet.fif"),
            recover_fif: smartcont.join("recover-stake.fif"),
            elect_req_fif: smartcont.join("validator-elect-req.fif"),
            elect_signed_fif: smartcont.join("validator-elect-signed.fif"),
            work_dir: std::env::temp_dir().join("elector"),
        }
    }
}
