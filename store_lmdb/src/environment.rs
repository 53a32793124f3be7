//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RwTxn};

use crate::codec::read_u64;
use crate::migration::Migrator;
use crate::LmdbError;

/// Default LMDB map size. The ledger holds a handful of rows per election,
/// so this is generous.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

const MAX_DBS: u32 = 8;

/// The LMDB environment and all database handles of the ledger.
pub struct LmdbStore {
    pub(crate) env: Env,
    pub(crate) wallets_db: Database<Bytes, Bytes>,
    pub(crate) nodes_db: Database<Bytes, Bytes>,
    pub(crate) elections_db: Database<Bytes, Bytes>,
    pub(crate) keys_db: Database<Bytes, Bytes>,
    pub(crate) registrations_db: Database<Bytes, Bytes>,
    pub(crate) participations_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    path: PathBuf,
}

impl LmdbStore {
    /// Open or create the ledger at `path` and bring its schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and the data
        // directory is not shared with other writers.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let wallets_db = env.create_database(&mut wtxn, Some("wallets"))?;
        let nodes_db = env.create_database(&mut wtxn, Some("nodes"))?;
        let elections_db = env.create_database(&mut wtxn, Some("elections"))?;
        let keys_db = env.create_database(&mut wtxn, Some("keys"))?;
        let registrations_db = env.create_database(&mut wtxn, Some("key_registrations"))?;
        let participations_db = env.create_database(&mut wtxn, Some("participations"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            env,
            wallets_db,
            nodes_db,
            elections_db,
            keys_db,
            registrations_db,
            participations_db,
            meta_db,
            path: path.to_path_buf(),
        };
        Migrator::run(&store)?;
        tracing::info!(path = %store.path.display(), "ledger opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Increment and return a named counter inside an open write transaction.
    pub(crate) fn next_counter(
        &self,
        wtxn: &mut RwTxn<'_>,
        counter: &str,
    ) -> Result<u64, LmdbError> {
        let current = match self.meta_db.get(wtxn, counter.as_bytes())? {
            Some(bytes) => read_u64(bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.meta_db
            .put(wtxn, counter.as_bytes(), &next.to_le_bytes())?;
        Ok(next)
    }
}
