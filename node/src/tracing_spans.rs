//! Pre-built [`tracing::Span`] constructors for the orchestrator's units of
//! work.
//!
//! Every event logged while a span is entered carries its fields, so a
//! failure deep inside key handling still names the wallet, node and
//! election it belongs to.

use tracing::{field, info_span, Span};

use elector_types::{ElectionId, Node, Wallet};

/// Span covering one orchestrator tick. `election` is recorded once the
/// active election is known.
pub fn tick_span() -> Span {
    info_span!("tick", election = field::Empty)
}

/// Record the active election on a [`tick_span`].
pub fn record_election(span: &Span, election: ElectionId) {
    span.record("election", election.as_u64());
}

/// Span covering balance sync, recovery and node processing for one wallet.
pub fn wallet_span(wallet: &Wallet) -> Span {
    info_span!("wallet", wallet = %wallet.id, address = %wallet.address)
}

/// Span covering key lifecycle and stake submission for one node.
pub fn node_span(node: &Node) -> Span {
    info_span!("node", node = %node.id, host = %node.host_port)
}
