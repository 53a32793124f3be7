//! Nullable node console: hands out sequential key handles and records
//! every command per node.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use elector_toolchain::{ElectionRequest, NodeConsole, NodeStats, ToolError};
use elector_types::{ElectionId, KeyHandle, Node, NodeId, Signature};

use crate::injected;

/// TL prefix the real console puts in front of exported ed25519 keys.
const PUB_PREFIX: [u8; 4] = [0xc6, 0xb4, 0x13, 0x48];

/// One recorded console command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCall {
    CreateKey {
        node: NodeId,
    },
    ExportPublicKey {
        node: NodeId,
        key: KeyHandle,
    },
    Sign {
        node: NodeId,
        key: KeyHandle,
        request: String,
    },
    AddPermanentKey {
        node: NodeId,
        key: KeyHandle,
        election_id: ElectionId,
        expire_at: u64,
    },
    AddTemporaryKey {
        node: NodeId,
        permanent: KeyHandle,
        key: KeyHandle,
        expire_at: u64,
    },
    AddAdnl {
        node: NodeId,
        key: KeyHandle,
        category: u32,
    },
    AddValidatorAddress {
        node: NodeId,
        permanent: KeyHandle,
        adnl: KeyHandle,
        expire_at: u64,
    },
    Stats {
        node: NodeId,
    },
}

impl ConsoleCall {
    pub fn node(&self) -> NodeId {
        match self {
            ConsoleCall::CreateKey { node }
            | ConsoleCall::ExportPublicKey { node, .. }
            | ConsoleCall::Sign { node, .. }
            | ConsoleCall::AddPermanentKey { node, .. }
            | ConsoleCall::AddTemporaryKey { node, .. }
            | ConsoleCall::AddAdnl { node, .. }
            | ConsoleCall::AddValidatorAddress { node, .. }
            | ConsoleCall::Stats { node } => *node,
        }
    }

    /// Whether the command changes node state (as opposed to reading it).
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ConsoleCall::Stats { .. })
    }
}

struct ConsoleState {
    next_key: u64,
    scripted_keys: VecDeque<KeyHandle>,
    stats: NodeStats,
    calls: Vec<ConsoleCall>,
    failing_nodes: HashSet<NodeId>,
    fail_registration: bool,
}

/// A deterministic [`NodeConsole`].
///
/// New keys are `KEY1`, `KEY2`, ... unless handles were queued with
/// [`NullConsole::queue_keys`]. Exported public keys are derived from the
/// handle so that different keys have different public keys.
pub struct NullConsole {
    state: Mutex<ConsoleState>,
}

impl NullConsole {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                next_key: 0,
                scripted_keys: VecDeque::new(),
                stats: NodeStats {
                    unixtime: 1_000,
                    masterchain_block_time: 1_000,
                },
                calls: Vec::new(),
                failing_nodes: HashSet::new(),
                fail_registration: false,
            }),
        }
    }

    /// Handles returned by the next `create_key` calls, in order.
    pub fn queue_keys<I, S>(&self, handles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .unwrap()
            .scripted_keys
            .extend(handles.into_iter().map(KeyHandle::new));
    }

    pub fn set_stats(&self, stats: NodeStats) {
        self.state.lock().unwrap().stats = stats;
    }

    /// Every command sent to `node` fails.
    pub fn fail_node(&self, node: NodeId) {
        self.state.lock().unwrap().failing_nodes.insert(node);
    }

    /// Key registration commands fail on every node; key creation still works.
    pub fn fail_registration(&self, fail: bool) {
        self.state.lock().unwrap().fail_registration = fail;
    }

    pub fn calls(&self) -> Vec<ConsoleCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, node: NodeId) -> Vec<ConsoleCall> {
        self.calls().into_iter().filter(|c| c.node() == node).collect()
    }

    /// Number of state-changing commands sent so far.
    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_mutation()).count()
    }

    /// Exported public key for `key`, as this console would report it.
    pub fn public_key_of(key: &KeyHandle) -> KeyHandle {
        let seed = key.as_str().as_bytes();
        let mut raw = PUB_PREFIX.to_vec();
        raw.extend((0..32).map(|i| seed.get(i % seed.len().max(1)).copied().unwrap_or(0) ^ i as u8));
        KeyHandle::new(STANDARD.encode(raw))
    }

    fn record(&self, call: ConsoleCall) -> Result<(), ToolError> {
        let mut state = self.state.lock().unwrap();
        let registration = matches!(
            call,
            ConsoleCall::AddPermanentKey { .. }
                | ConsoleCall::AddTemporaryKey { .. }
                | ConsoleCall::AddAdnl { .. }
                | ConsoleCall::AddValidatorAddress { .. }
        );
        let fails = state.failing_nodes.contains(&call.node())
            || (registration && state.fail_registration);
        state.calls.push(call);
        if fails {
            Err(injected("validator-engine-console"))
        } else {
            Ok(())
        }
    }
}

impl Default for NullConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeConsole for NullConsole {
    fn create_key(&self, node: &Node) -> Result<KeyHandle, ToolError> {
        self.record(ConsoleCall::CreateKey { node: node.id })?;
        let mut state = self.state.lock().unwrap();
        if let Some(handle) = state.scripted_keys.pop_front() {
            return Ok(handle);
        }
        state.next_key += 1;
        Ok(KeyHandle::new(format!("KEY{}", state.next_key)))
    }

    fn export_public_key(&self, node: &Node, key: &KeyHandle) -> Result<KeyHandle, ToolError> {
        self.record(ConsoleCall::ExportPublicKey {
            node: node.id,
            key: key.clone(),
        })?;
        Ok(Self::public_key_of(key))
    }

    fn sign(
        &self,
        node: &Node,
        key: &KeyHandle,
        request: &ElectionRequest,
    ) -> Result<Signature, ToolError> {
        self.record(ConsoleCall::Sign {
            node: node.id,
            key: key.clone(),
            request: request.as_str().to_string(),
        })?;
        Ok(Signature::new(format!("SIG-{key}")))
    }

    fn add_permanent_key(
        &self,
        node: &Node,
        key: &KeyHandle,
        election_id: ElectionId,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        self.record(ConsoleCall::AddPermanentKey {
            node: node.id,
            key: key.clone(),
            election_id,
            expire_at,
        })
    }

    fn add_temporary_key(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        key: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        self.record(ConsoleCall::AddTemporaryKey {
            node: node.id,
            permanent: permanent.clone(),
            key: key.clone(),
            expire_at,
        })
    }

    fn add_adnl(&self, node: &Node, key: &KeyHandle, category: u32) -> Result<(), ToolError> {
        self.record(ConsoleCall::AddAdnl {
            node: node.id,
            key: key.clone(),
            category,
        })
    }

    fn add_validator_address(
        &self,
        node: &Node,
        permanent: &KeyHandle,
        adnl: &KeyHandle,
        expire_at: u64,
    ) -> Result<(), ToolError> {
        self.record(ConsoleCall::AddValidatorAddress {
            node: node.id,
            permanent: permanent.clone(),
            adnl: adnl.clone(),
            expire_at,
        })
    }

    fn stats(&self, node: &Node) -> Result<NodeStats, ToolError> {
        self.record(ConsoleCall::Stats { node: node.id })?;
        Ok(self.state.lock().unwrap().stats)
    }
}
