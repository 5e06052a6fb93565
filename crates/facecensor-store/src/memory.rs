//! In-memory storage implementation.
//!
//! Used by tests and by the service when built without the `RocksDB` backend.
//! Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use facecensor_core::{
    Account, AccountId, CreditTransaction, ImageId, ImageJob, TransactionId, TransactionKind,
};

use crate::error::{Result, StoreError};
use crate::ledger;
use crate::Store;

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, CreditTransaction>,
    transactions_by_account: HashMap<AccountId, Vec<TransactionId>>,
    images: HashMap<ImageId, ImageJob>,
    images_by_account: HashMap<AccountId, Vec<ImageId>>,
}

impl Inner {
    fn append_transaction(&mut self, tx: CreditTransaction) {
        self.transactions_by_account
            .entry(tx.account_id)
            .or_default()
            .push(tx.id);
        self.transactions.insert(tx.id, tx);
    }

    fn account_mut(&mut self, account_id: &AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(account_id)
            .ok_or_else(|| ledger::account_not_found(account_id))
    }
}

/// Store keeping every record in process memory.
///
/// All writes take one exclusive lock, so ledger updates are serialized
/// across every account.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

/// Newest-first page over an append-ordered index.
fn page<'a, K, V: Clone + 'a>(
    ids: Option<&'a Vec<K>>,
    records: &'a HashMap<K, V>,
    limit: usize,
    offset: usize,
) -> Vec<V>
where
    K: std::hash::Hash + Eq,
{
    ids.map(|ids| {
        ids.iter()
            .rev()
            .skip(offset)
            .take(limit)
            .filter_map(|id| records.get(id).cloned())
            .collect()
    })
    .unwrap_or_default()
}

impl Store for MemoryStore {
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        Ok(self.read()?.accounts.get(account_id).cloned())
    }

    fn create_account(&self, account_id: &AccountId, welcome_bonus: i64) -> Result<Account> {
        if welcome_bonus < 0 {
            return Err(StoreError::InvalidAmount(format!(
                "welcome bonus must not be negative, got {welcome_bonus}"
            )));
        }

        let mut inner = self.write()?;
        if inner.accounts.contains_key(account_id) {
            return Err(StoreError::AlreadyExists {
                entity: "account",
                id: account_id.to_string(),
            });
        }

        let mut account = Account::new(*account_id);
        if welcome_bonus > 0 {
            account.credit(welcome_bonus, TransactionKind::WelcomeBonus)?;
            inner.append_transaction(CreditTransaction::welcome_bonus(*account_id, welcome_bonus));
        }
        inner.accounts.insert(*account_id, account.clone());
        Ok(account)
    }

    fn add_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction> {
        let mut inner = self.write()?;
        let tx = ledger::credit_entry(inner.account_mut(account_id)?, amount, kind, description)?;
        inner.append_transaction(tx.clone());
        Ok(tx)
    }

    fn deduct_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction> {
        let mut inner = self.write()?;
        let tx = ledger::debit_entry(inner.account_mut(account_id)?, amount, kind, description)?;
        inner.append_transaction(tx.clone());
        Ok(tx)
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        Ok(self.read()?.transactions.get(transaction_id).cloned())
    }

    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let inner = self.read()?;
        Ok(page(
            inner.transactions_by_account.get(account_id),
            &inner.transactions,
            limit,
            offset,
        ))
    }

    fn begin_image_job(&self, job: &ImageJob) -> Result<CreditTransaction> {
        let mut inner = self.write()?;
        if inner.images.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists {
                entity: "image",
                id: job.id.to_string(),
            });
        }

        // Mutate a copy so a rejected debit leaves the account untouched.
        let mut account = inner
            .accounts
            .get(&job.account_id)
            .cloned()
            .ok_or_else(|| ledger::account_not_found(&job.account_id))?;
        let tx = ledger::usage_entry(&mut account, job)?;

        inner.accounts.insert(job.account_id, account);
        inner.append_transaction(tx.clone());
        inner
            .images_by_account
            .entry(job.account_id)
            .or_default()
            .push(job.id);
        inner.images.insert(job.id, job.clone());
        Ok(tx)
    }

    fn get_image(&self, image_id: &ImageId) -> Result<Option<ImageJob>> {
        Ok(self.read()?.images.get(image_id).cloned())
    }

    fn update_image(&self, job: &ImageJob) -> Result<()> {
        let mut inner = self.write()?;
        let stored = inner.images.get(&job.id).ok_or_else(|| StoreError::NotFound {
            entity: "image",
            id: job.id.to_string(),
        })?;
        ledger::check_image_update(stored, job)?;
        inner.images.insert(job.id, job.clone());
        Ok(())
    }

    fn list_images_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageJob>> {
        let inner = self.read()?;
        Ok(page(
            inner.images_by_account.get(account_id),
            &inner.images,
            limit,
            offset,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecensor_core::{BlobId, ImageStatus, MediaType};
    use std::sync::Arc;
    use std::thread;

    fn job_for(account_id: AccountId) -> ImageJob {
        ImageJob::processing(
            account_id,
            &BlobId::generate(),
            MediaType::Jpeg,
            "group.jpg".to_string(),
        )
    }

    #[test]
    fn create_account_grants_welcome_bonus() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();

        let account = store.create_account(&account_id, 1).unwrap();
        assert_eq!(account.credits, 1);
        assert_eq!(account.lifetime_granted, 1);

        let txs = store.list_transactions_by_account(&account_id, 10, 0).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].kind, TransactionKind::WelcomeBonus);
        assert_eq!(txs[0].delta, 1);
        assert_eq!(txs[0].balance_after, 1);
    }

    #[test]
    fn create_account_twice_conflicts() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let err = store.create_account(&account_id, 1).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.balance(&account_id).unwrap(), 1);
    }

    #[test]
    fn balance_of_unknown_account_is_not_found() {
        let store = MemoryStore::new();
        let err = store.balance(&AccountId::generate()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "account", .. }));
    }

    #[test]
    fn add_and_deduct_credits() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 0).unwrap();

        let tx = store
            .add_credits(&account_id, 5, TransactionKind::Purchase, "Credit pack")
            .unwrap();
        assert_eq!(tx.delta, 5);
        assert_eq!(tx.balance_after, 5);

        let tx = store
            .deduct_credits(&account_id, 2, TransactionKind::Usage, "Manual usage")
            .unwrap();
        assert_eq!(tx.delta, -2);
        assert_eq!(tx.balance_after, 3);
        assert_eq!(store.balance(&account_id).unwrap(), 3);
    }

    #[test]
    fn deduct_more_than_balance_fails_without_side_effects() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let err = store
            .deduct_credits(&account_id, 2, TransactionKind::Usage, "too much")
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientCredits {
                balance: 1,
                required: 2
            }
        ));
        assert_eq!(store.balance(&account_id).unwrap(), 1);
        assert_eq!(
            store
                .list_transactions_by_account(&account_id, 10, 0)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn credit_kind_cannot_deduct() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let err = store
            .deduct_credits(&account_id, 1, TransactionKind::Purchase, "refund?")
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAmount(_)));
    }

    #[test]
    fn transactions_list_newest_first_with_paging() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();
        for n in 1..=3 {
            store
                .add_credits(&account_id, n, TransactionKind::Purchase, "pack")
                .unwrap();
        }

        let all = store.list_transactions_by_account(&account_id, 10, 0).unwrap();
        let deltas: Vec<i64> = all.iter().map(|tx| tx.delta).collect();
        assert_eq!(deltas, vec![3, 2, 1, 1]);

        let page = store.list_transactions_by_account(&account_id, 2, 1).unwrap();
        let deltas: Vec<i64> = page.iter().map(|tx| tx.delta).collect();
        assert_eq!(deltas, vec![2, 1]);
    }

    #[test]
    fn begin_image_job_debits_and_records() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let job = job_for(account_id);
        let tx = store.begin_image_job(&job).unwrap();
        assert_eq!(tx.kind, TransactionKind::Usage);
        assert_eq!(tx.delta, -1);
        assert_eq!(tx.balance_after, 0);
        assert_eq!(tx.metadata["image_id"], job.id.to_string());

        let stored = store.get_image(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, ImageStatus::Processing);
        assert_eq!(store.balance(&account_id).unwrap(), 0);
        assert_eq!(
            store.get_account(&account_id).unwrap().unwrap().lifetime_used,
            1
        );
    }

    #[test]
    fn begin_image_job_without_credits_writes_nothing() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 0).unwrap();

        let job = job_for(account_id);
        let err = store.begin_image_job(&job).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientCredits { .. }));
        assert!(store.get_image(&job.id).unwrap().is_none());
        assert!(store
            .list_transactions_by_account(&account_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn update_image_moves_to_terminal_once() {
        let store = MemoryStore::new();
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let mut job = job_for(account_id);
        store.begin_image_job(&job).unwrap();

        job.mark_done(2).unwrap();
        store.update_image(&job).unwrap();
        let stored = store.get_image(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, ImageStatus::Done);
        assert_eq!(stored.faces_detected, 2);

        // A stale processing copy must not resurrect a finished job.
        let mut stale = stored.clone();
        stale.status = ImageStatus::Processing;
        let err = store.update_image(&stale).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[test]
    fn update_unknown_image_is_not_found() {
        let store = MemoryStore::new();
        let err = store.update_image(&job_for(AccountId::generate())).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "image", .. }));
    }

    #[test]
    fn images_are_scoped_to_account() {
        let store = MemoryStore::new();
        let alice = AccountId::generate();
        let bob = AccountId::generate();
        store.create_account(&alice, 2).unwrap();
        store.create_account(&bob, 1).unwrap();

        let first = job_for(alice);
        let second = job_for(alice);
        store.begin_image_job(&first).unwrap();
        store.begin_image_job(&second).unwrap();
        store.begin_image_job(&job_for(bob)).unwrap();

        let images = store.list_images_by_account(&alice, 10, 0).unwrap();
        let ids: Vec<ImageId> = images.iter().map(|job| job.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(store.list_images_by_account(&bob, 10, 0).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_jobs_never_overdraw() {
        let store = Arc::new(MemoryStore::new());
        let account_id = AccountId::generate();
        store.create_account(&account_id, 1).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.begin_image_job(&job_for(account_id)).is_ok())
            })
            .collect();
        let succeeded = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 1);
        assert_eq!(store.balance(&account_id).unwrap(), 0);
        assert_eq!(store.list_images_by_account(&account_id, 10, 0).unwrap().len(), 1);
    }
}
