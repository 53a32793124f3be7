//! LMDB implementation of KeyStore.

use elector_store::key::KeyStore;
use elector_store::StoreError;
use elector_types::{ElectionId, KeyRecord, KeyType, NodeId};

use crate::codec::{decode, encode, key_record_key};
use crate::{LmdbError, LmdbStore};

const REGISTERED: &[u8] = &[1];

impl KeyStore for LmdbStore {
    fn get_key(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<Option<KeyRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .keys_db
            .get(&rtxn, &key_record_key(node, election, key_type))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn add_key(&self, record: &KeyRecord) -> Result<(), StoreError> {
        let key = key_record_key(record.node_id, record.election_id, record.key_type);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .keys_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(LmdbError::Duplicate(format!(
                "{} key of node {} for election {}",
                record.key_type, record.node_id, record.election_id
            ))
            .into());
        }
        self.keys_db
            .put(&mut wtxn, &key, &encode(record)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn is_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .registrations_db
            .get(&rtxn, &key_record_key(node, election, key_type))
            .map_err(LmdbError::from)?;
        Ok(val.is_some())
    }

    fn mark_registered(
        &self,
        node: NodeId,
        election: ElectionId,
        key_type: KeyType,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.registrations_db
            .put(&mut wtxn, &key_record_key(node, election, key_type), REGISTERED)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
