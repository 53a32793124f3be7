//! LMDB implementation of ElectionStore.

use elector_store::election::ElectionStore;
use elector_store::StoreError;
use elector_types::{ElectionId, ElectionWindow};

use crate::codec::{decode, encode, id_key};
use crate::{LmdbError, LmdbStore};

impl ElectionStore for LmdbStore {
    fn get_election(&self, id: ElectionId) -> Result<Option<ElectionWindow>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .elections_db
            .get(&rtxn, &id_key(id.as_u64()))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn add_election(&self, window: &ElectionWindow) -> Result<(), StoreError> {
        let key = id_key(window.election_id.as_u64());
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .elections_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(LmdbError::Duplicate(format!("election {}", window.election_id)).into());
        }
        self.elections_db
            .put(&mut wtxn, &key, &encode(window)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn list_elections(&self) -> Result<Vec<ElectionWindow>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut elections = Vec::new();
        for entry in self.elections_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            elections.push(decode(val)?);
        }
        Ok(elections)
    }
}
