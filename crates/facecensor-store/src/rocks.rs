//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use facecensor_core::{
    Account, AccountId, CreditTransaction, ImageId, ImageJob, TransactionId, TransactionKind,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::ledger;
use crate::locks::{poisoned, AccountLocks};
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: AccountLocks,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            locks: AccountLocks::new(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Queue a transaction and its account index entry.
    fn batch_transaction(&self, batch: &mut WriteBatch, tx: &CreditTransaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;

        batch.put_cf(&cf_tx, keys::transaction_key(&tx.id), Self::serialize(tx)?);
        batch.put_cf(
            &cf_by_account,
            keys::account_index_key(&tx.account_id, tx.id.to_bytes()),
            [],
        ); // Index entry (empty value)
        Ok(())
    }

    fn batch_account(&self, batch: &mut WriteBatch, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        batch.put_cf(
            &cf,
            keys::account_key(&account.account_id),
            Self::serialize(account)?,
        );
        Ok(())
    }

    /// Apply one ledger entry under the account's lock.
    fn apply_entry<F>(&self, account_id: &AccountId, entry: F) -> Result<CreditTransaction>
    where
        F: FnOnce(&mut Account) -> Result<CreditTransaction>,
    {
        let handle = self.locks.handle(account_id)?;
        let _guard = handle.lock().map_err(poisoned)?;

        let mut account = self
            .get_account(account_id)?
            .ok_or_else(|| ledger::account_not_found(account_id))?;
        let tx = entry(&mut account)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, &tx)?;
        self.write(batch)?;

        Ok(tx)
    }

    /// Collect the ULID suffixes of an account's index, newest first.
    fn page_index(
        &self,
        cf_name: &str,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<[u8; 16]>> {
        let cf = self.cf(cf_name)?;
        let prefix = keys::account_prefix(account_id);
        let upper = keys::account_upper_bound(account_id);

        // Seek to the end of the account's range and walk backwards.
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&upper, Direction::Reverse));

        let mut suffixes = Vec::new();
        for item in iter.skip(offset) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) || suffixes.len() >= limit {
                break;
            }
            suffixes.push(keys::index_suffix(&key)?);
        }
        Ok(suffixes)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.get(cf::ACCOUNTS, &keys::account_key(account_id))
    }

    fn create_account(&self, account_id: &AccountId, welcome_bonus: i64) -> Result<Account> {
        if welcome_bonus < 0 {
            return Err(StoreError::InvalidAmount(format!(
                "welcome bonus must not be negative, got {welcome_bonus}"
            )));
        }

        let handle = self.locks.handle(account_id)?;
        let _guard = handle.lock().map_err(poisoned)?;

        if self.get_account(account_id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "account",
                id: account_id.to_string(),
            });
        }

        let mut account = Account::new(*account_id);
        let mut batch = WriteBatch::default();
        if welcome_bonus > 0 {
            account.credit(welcome_bonus, TransactionKind::WelcomeBonus)?;
            let tx = CreditTransaction::welcome_bonus(*account_id, welcome_bonus);
            self.batch_transaction(&mut batch, &tx)?;
        }
        self.batch_account(&mut batch, &account)?;
        self.write(batch)?;

        tracing::debug!(account_id = %account_id, welcome_bonus, "Account stored");
        Ok(account)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn add_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction> {
        self.apply_entry(account_id, |account| {
            ledger::credit_entry(account, amount, kind, description)
        })
    }

    fn deduct_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction> {
        self.apply_entry(account_id, |account| {
            ledger::debit_entry(account, amount, kind, description)
        })
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        self.get(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let mut transactions = Vec::new();
        for suffix in self.page_index(cf::TRANSACTIONS_BY_ACCOUNT, account_id, limit, offset)? {
            if let Some(tx) = self.get_transaction(&TransactionId::from_bytes(suffix))? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    // =========================================================================
    // Image Job Operations
    // =========================================================================

    fn begin_image_job(&self, job: &ImageJob) -> Result<CreditTransaction> {
        let handle = self.locks.handle(&job.account_id)?;
        let _guard = handle.lock().map_err(poisoned)?;

        if self.get_image(&job.id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "image",
                id: job.id.to_string(),
            });
        }

        let mut account = self
            .get_account(&job.account_id)?
            .ok_or_else(|| ledger::account_not_found(&job.account_id))?;
        let tx = ledger::usage_entry(&mut account, job)?;

        let cf_images = self.cf(cf::IMAGES)?;
        let cf_by_account = self.cf(cf::IMAGES_BY_ACCOUNT)?;

        let mut batch = WriteBatch::default();
        self.batch_account(&mut batch, &account)?;
        self.batch_transaction(&mut batch, &tx)?;
        batch.put_cf(&cf_images, keys::image_key(&job.id), Self::serialize(job)?);
        batch.put_cf(
            &cf_by_account,
            keys::account_index_key(&job.account_id, job.id.to_bytes()),
            [],
        );
        self.write(batch)?;

        Ok(tx)
    }

    fn get_image(&self, image_id: &ImageId) -> Result<Option<ImageJob>> {
        self.get(cf::IMAGES, &keys::image_key(image_id))
    }

    fn update_image(&self, job: &ImageJob) -> Result<()> {
        let handle = self.locks.handle(&job.account_id)?;
        let _guard = handle.lock().map_err(poisoned)?;

        let stored = self.get_image(&job.id)?.ok_or_else(|| StoreError::NotFound {
            entity: "image",
            id: job.id.to_string(),
        })?;
        ledger::check_image_update(&stored, job)?;

        let cf = self.cf(cf::IMAGES)?;
        self.db
            .put_cf(&cf, keys::image_key(&job.id), Self::serialize(job)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_images_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageJob>> {
        let mut images = Vec::new();
        for suffix in self.page_index(cf::IMAGES_BY_ACCOUNT, account_id, limit, offset)? {
            if let Some(job) = self.get_image(&ImageId::from_bytes(suffix))? {
                images.push(job);
            }
        }
        Ok(images)
    }
}
