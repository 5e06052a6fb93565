//! Storage layer for FaceCensor.
//!
//! This crate provides persistent storage for accounts, the credit ledger and
//! image job records, plus the byte store holding uploaded and censored images.
//!
//! # Architecture
//!
//! The `RocksDB` backend uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `account_id`
//! - `transactions`: Credit transactions, keyed by `transaction_id` (ULID)
//! - `transactions_by_account`: Index for listing transactions by account
//! - `images`: Image job records, keyed by `image_id` (ULID)
//! - `images_by_account`: Index for listing image jobs by account
//!
//! Ledger mutations on one account are serialized, so concurrent debits can
//! never drive a balance below zero.
//!
//! # Example
//!
//! ```no_run
//! use facecensor_store::{MemoryStore, Store};
//! use facecensor_core::AccountId;
//!
//! let store = MemoryStore::new();
//!
//! // Provision an account with the welcome bonus
//! let account_id = AccountId::generate();
//! store.create_account(&account_id, 1).unwrap();
//!
//! assert_eq!(store.balance(&account_id).unwrap(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod blob;
pub mod error;
pub mod keys;
mod ledger;
pub mod locks;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use facecensor_core::{
    Account, AccountId, CreditTransaction, ImageId, ImageJob, TransactionId, TransactionKind,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Create an account, granting `welcome_bonus` credits in the same write.
    ///
    /// A zero bonus creates the account without a transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyExists` if the account exists.
    /// - `StoreError::InvalidAmount` if the bonus is negative.
    fn create_account(&self, account_id: &AccountId, welcome_bonus: i64) -> Result<Account>;

    /// Current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn balance(&self, account_id: &AccountId) -> Result<i64> {
        self.get_account(account_id)?
            .map(|account| account.credits)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: account_id.to_string(),
            })
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Add credits to an account and record the transaction atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` for a non-positive amount or a debit kind.
    fn add_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction>;

    /// Deduct credits from an account and record the transaction atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance is too low.
    /// - `StoreError::InvalidAmount` for a non-positive amount or a credit kind.
    fn deduct_credits(
        &self,
        account_id: &AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<CreditTransaction>;

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>>;

    /// List transactions for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;

    // =========================================================================
    // Image Job Operations
    // =========================================================================

    /// Charge for an image and create its job record in one atomic write.
    ///
    /// Debits `job.credits_used`, appends the `usage` transaction and stores
    /// the job (expected in the `processing` state). Returns the transaction.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if the balance is too low.
    /// - `StoreError::AlreadyExists` if the job ID is taken.
    fn begin_image_job(&self, job: &ImageJob) -> Result<CreditTransaction>;

    /// Get an image job by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_image(&self, image_id: &ImageId) -> Result<Option<ImageJob>>;

    /// Persist a state change of an existing image job.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the job doesn't exist.
    /// - `StoreError::InvalidTransition` if the stored job is already terminal
    ///   or the owner differs.
    fn update_image(&self, job: &ImageJob) -> Result<()>;

    /// List image jobs for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_images_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageJob>>;
}
