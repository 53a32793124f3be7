//! Participation audit trail.

use elector_types::{ElectionId, NodeId, Participation};

use crate::StoreError;

/// Append-only log of stake bids handed to the chain.
///
/// The chain's own view of staked amounts stays authoritative; these
/// records only guard against resubmitting while a bid is in flight.
pub trait ParticipationStore {
    fn add_participation(&self, participation: &Participation) -> Result<(), StoreError>;

    /// Bids for one `(node, election)`, oldest first.
    fn participations(
        &self,
        node: NodeId,
        election: ElectionId,
    ) -> Result<Vec<Participation>, StoreError>;

    /// Every bid recorded for `node`, oldest first.
    fn node_participations(&self, node: NodeId) -> Result<Vec<Participation>, StoreError>;
}
