//! Election storage trait.

use elector_types::{ElectionId, ElectionWindow};

use crate::StoreError;

/// One row per distinct election id, written once and never updated.
pub trait ElectionStore {
    fn get_election(&self, id: ElectionId) -> Result<Option<ElectionWindow>, StoreError>;

    /// Persist a new election. Fails with `Duplicate` if the id exists.
    fn add_election(&self, window: &ElectionWindow) -> Result<(), StoreError>;

    /// All known elections, oldest first.
    fn list_elections(&self) -> Result<Vec<ElectionWindow>, StoreError>;
}
