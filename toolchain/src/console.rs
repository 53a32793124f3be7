//! [`NodeConsole`] over the `validator-engine-console` binary.

use std::time::Duration;

use elector_types::{ElectionId, KeyHandle, Node, Signature};

use crate::config::ConsoleConfig;
use crate::error::ToolError;
use crate::parse;
use crate::runner::ToolRunner;
use crate::{ElectionRequest, NodeConsole, NodeStats};

/// Connects to the node named in each call with that node's own
/// credentials; one console instance serves every node.
#[derive(Clone, Debug)]
pub struct ValidatorConsole {
    config: ConsoleConfig,
    runner: ToolRunner,
}

impl ValidatorConsole {
    pub fn new(config: ConsoleConfig, timeout: Duration, verbose: bool) -> Self {
        Self {
            config,
            runner: ToolRunner::new(timeout).verbose(verbose),
        }
    }

    fn exec(&self, node: &Node, command: &str) -> Result<String, ToolError> {
        let args = vec![
            "-k".to_string(),
            node.client_cert.display().to_string(),
            "-p".to_string(),
            node.server_pub.display().to_string(),
            "-a".to_string(),
            node.host_port.clone(),
            "-v".to_string(),
            "0".to_string(),
            "-c".to_string(),
            command.to_string(),
        ];
        self.runner.run(&self.config.bin, &args)
    }
}

impl NodeConsole for ValidatorConsole {
    fn create_key(&self, node: &Node) -> Result<KeyHandle, ToolError> {
        parse::parse_new_key(&self.exec(node, "newkey")?)
    }

    fn export_public_key(&self, node: &Node, key: &KeyHandle) -> Result<KeyHandle, ToolError> {
        parse::parse_public_key(&self.exec(node, &format!("exportpub {key}"))?)
    }

    fn sign(
        &self,
        node: &Node,
        key: &KeyHandle,
        request: &ElectionRequest,
    ) -> Result<Signature, ToolError> {
        let out = self.exec(node, &format!("sign {key} {}", request.as_str()))?;
        parse::parse_signature(&out)
    }

    fn add_permanent_key(
        &self,
        node: &Node,
        key: &KeyHandle,
        election_id: ElectionId,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        let out = self.exec(node, &format!("addpermkey {key} {election_id} {expire_at}"))?;
        parse::expect_success(&out)
    }

    fn add_temporary_key(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        key: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        let out = self.exec(node, &format!("addtempkey {permanent} {key} {expire_at}"))?;
        parse::expect_success(&out)
    }

    fn add_adnl(&self, node: &Node, key: &KeyHandle, category: u32) -> Result<(), ToolError> {
        parse::expect_success(&self.exec(node, &format!("addadnl {key} {category}"))?)
    }

    fn add_validator_address(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        adnl: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        let out = self.exec(
            node,
            &format!("addvalidatoraddr {permanent} {adnl} {expire_at}"),
        )?;
        parse::expect_success(&out)
    }

    fn stats(&self, node: &Node) -> Result<NodeStats, ToolError> {
        parse::parse_stats(&self.exec(node, "getstats")?)
    }
}
