//! LMDB implementation of WalletStore.

use std::path::PathBuf;

use elector_store::wallet::WalletStore;
use elector_store::{EnabledFilter, StoreError};
use elector_types::{AccountAddress, Nanotons, Wallet, WalletId};

use crate::codec::{decode, encode, id_key};
use crate::{LmdbError, LmdbStore};

const WALLET_COUNTER: &str = "next_wallet_id";

impl LmdbStore {
    fn modify_wallet(
        &self,
        id: WalletId,
        f: impl FnOnce(&mut Wallet),
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut wallet: Wallet = match self
            .wallets_db
            .get(&wtxn, &id_key(id.0))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode(bytes)?,
            None => return Err(LmdbError::NotFound(format!("wallet {}", id)).into()),
        };
        f(&mut wallet);
        self.wallets_db
            .put(&mut wtxn, &id_key(id.0), &encode(&wallet)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl WalletStore for LmdbStore {
    fn add_wallet(&self, address: AccountAddress, key_file: PathBuf) -> Result<Wallet, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = WalletId(self.next_counter(&mut wtxn, WALLET_COUNTER)?);
        let wallet = Wallet {
            id,
            address,
            key_file,
            balance: Nanotons::ZERO,
            enabled: true,
        };
        self.wallets_db
            .put(&mut wtxn, &id_key(id.0), &encode(&wallet)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(wallet)
    }

    fn get_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .wallets_db
            .get(&rtxn, &id_key(id.0))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn list_wallets(&self, filter: EnabledFilter) -> Result<Vec<Wallet>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut wallets = Vec::new();
        for entry in self.wallets_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, val) = entry.map_err(LmdbError::from)?;
            let wallet: Wallet = decode(val)?;
            if filter.matches(wallet.enabled) {
                wallets.push(wallet);
            }
        }
        Ok(wallets)
    }

    fn update_balance(&self, id: WalletId, balance: Nanotons) -> Result<(), StoreError> {
        self.modify_wallet(id, |w| w.balance = balance)
    }

    fn set_wallet_enabled(&self, id: WalletId, enabled: bool) -> Result<(), StoreError> {
        self.modify_wallet(id, |w| w.enabled = enabled)
    }

    fn delete_wallet(&self, id: WalletId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let removed = self
            .wallets_db
            .delete(&mut wtxn, &id_key(id.0))
            .map_err(LmdbError::from)?;
        if !removed {
            return Err(LmdbError::NotFound(format!("wallet {}", id)).into());
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
