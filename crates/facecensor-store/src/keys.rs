//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use facecensor_core::{AccountId, ImageId, TransactionId};

use crate::error::{Result, StoreError};

/// Length of an `account_id || ulid` index key.
pub const INDEX_KEY_LEN: usize = 32;

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create an image key from an image ID.
#[must_use]
pub fn image_key(image_id: &ImageId) -> Vec<u8> {
    image_id.to_bytes().to_vec()
}

/// Create a per-account index key.
///
/// Format: `account_id (16 bytes) || ulid (16 bytes)`
///
/// Since ULIDs are time-ordered, entries for an account sort by creation time.
#[must_use]
pub fn account_index_key(account_id: &AccountId, ulid_bytes: [u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_KEY_LEN);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&ulid_bytes);
    key
}

/// Create a prefix for iterating an account's index entries.
#[must_use]
pub fn account_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Smallest key sorting after every index entry of the account.
#[must_use]
pub fn account_upper_bound(account_id: &AccountId) -> Vec<u8> {
    account_index_key(account_id, [0xFF; 16])
}

/// Extract the trailing ULID bytes from a per-account index key.
///
/// # Errors
///
/// Returns `StoreError::Database` if the key is not exactly 32 bytes.
pub fn index_suffix(key: &[u8]) -> Result<[u8; 16]> {
    if key.len() != INDEX_KEY_LEN {
        return Err(StoreError::Database(format!(
            "malformed index key of length {}",
            key.len()
        )));
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..INDEX_KEY_LEN]);
    Ok(bytes)
}
