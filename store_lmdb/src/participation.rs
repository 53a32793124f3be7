//! LMDB implementation of ParticipationStore.

use std::ops::Bound;

use elector_store::participation::ParticipationStore;
use elector_store::StoreError;
use elector_types::{ElectionId, NodeId, Participation};

use crate::codec::{
    decode, encode, node_election_prefix, participation_key, prefix_upper_bound,
};
use crate::{LmdbError, LmdbStore};

const PARTICIPATION_COUNTER: &str = "next_participation_seq";

impl LmdbStore {
    fn scan_participations(&self, prefix: &[u8]) -> Result<Vec<Participation>, StoreError> {
        let upper = prefix_upper_bound(prefix);
        let bounds = (
            Bound::Included(prefix),
            upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
        );

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .participations_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            out.push(decode::<Participation>(val)?);
        }
        Ok(out)
    }
}

impl ParticipationStore for LmdbStore {
    fn add_participation(&self, participation: &Participation) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let seq = self.next_counter(&mut wtxn, PARTICIPATION_COUNTER)?;
        let key = participation_key(participation.node_id, participation.election_id, seq);
        self.participations_db
            .put(&mut wtxn, &key, &encode(participation)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn participations(
        &self,
        node: NodeId,
        election: ElectionId,
    ) -> Result<Vec<Participation>, StoreError> {
        self.scan_participations(&node_election_prefix(node, election))
    }

    fn node_participations(&self, node: NodeId) -> Result<Vec<Participation>, StoreError> {
        self.scan_participations(&node.0.to_be_bytes())
    }
}
