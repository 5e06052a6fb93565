//! Per-account mutual exclusion for read-modify-write ledger updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use facecensor_core::AccountId;

use crate::error::{Result, StoreError};

/// Lazily created mutex per account.
///
/// Holding an account's mutex while reading, mutating and writing its record
/// serializes all balance changes for that account. Different accounts never
/// contend. Entries nobody holds are dropped on the next lookup, so the table
/// only tracks accounts with a mutation in flight.
#[derive(Debug, Default)]
pub struct AccountLocks {
    handles: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the mutex guarding `account_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the table's mutex is poisoned.
    pub fn handle(&self, account_id: &AccountId) -> Result<Arc<Mutex<()>>> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|_| StoreError::Database("account lock table poisoned".into()))?;
        // Clones happen under the table lock, so a count of one means idle.
        handles.retain(|id, handle| id == account_id || Arc::strong_count(handle) > 1);
        Ok(Arc::clone(handles.entry(*account_id).or_default()))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.handles.lock().map(|h| h.len()).unwrap_or_default()
    }
}

/// Map a poisoned per-account mutex onto a storage error.
pub(crate) fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("account lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn same_account_shares_one_mutex() {
        let locks = AccountLocks::new();
        let account_id = AccountId::generate();

        let a = locks.handle(&account_id).unwrap();
        let b = locks.handle(&account_id).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let other = locks.handle(&AccountId::generate()).unwrap();
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn idle_entries_are_pruned() {
        let locks = AccountLocks::new();
        let held_id = AccountId::generate();
        let held = locks.handle(&held_id).unwrap();

        for _ in 0..100 {
            drop(locks.handle(&AccountId::generate()).unwrap());
        }
        assert_eq!(locks.len(), 2);

        let again = locks.handle(&held_id).unwrap();
        assert!(Arc::ptr_eq(&held, &again));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn critical_sections_do_not_overlap() {
        let locks = Arc::new(AccountLocks::new());
        let account_id = AccountId::generate();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let handle = locks.handle(&account_id).unwrap();
                        let _guard = handle.lock().unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
