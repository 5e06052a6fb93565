//! Blob storage for uploaded and censored image bytes.
//!
//! Blobs are write-once: a key is written exactly one time and never
//! modified afterwards. Keys are generated by the service (`{uuid}_orig.jpg`,
//! `{uuid}_censored.jpg`) and never taken from client input.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Result, StoreError};

/// Maximum accepted key length.
const MAX_KEY_LEN: usize = 128;

/// Write-once byte storage addressed by opaque keys.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidKey` if the key is malformed.
    /// - `StoreError::AlreadyExists` if the key was written before.
    /// - `StoreError::Io` if the write fails.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Read the bytes stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed keys or failed reads.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Whether `key` has been written.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed keys or failed lookups.
    fn exists(&self, key: &str) -> Result<bool>;
}

/// Reject keys that could escape the blob directory.
///
/// Allowed: ASCII alphanumerics plus `_`, `-` and `.`, not starting with `.`.
///
/// # Errors
///
/// Returns `StoreError::InvalidKey` for anything else.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Blob store backed by a flat directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if needed) a blob directory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the blobs.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        // Staged under a dot-prefixed name, which no valid key can collide with.
        let staging = self.root.join(format!(".{key}.partial"));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        // hard_link fails if the destination exists, so a key is never overwritten.
        let linked = fs::hard_link(&staging, &path);
        let _ = fs::remove_file(&staging);
        match linked {
            Ok(()) => {
                tracing::debug!(key, size = bytes.len(), "Blob stored");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists {
                entity: "blob",
                id: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.path(key)?.try_exists()?)
    }
}

/// Blob store keeping bytes in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Database("blob store lock poisoned".into())
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        if blobs.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                entity: "blob",
                id: key.to_string(),
            });
        }
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.blobs.read().map_err(poisoned)?.get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.blobs.read().map_err(poisoned)?.contains_key(key))
    }
}
