//! Error types for FaceCensor storage.

use facecensor_core::FaceCensorError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// Record already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting key.
        id: String,
    },

    /// Insufficient credits for deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Ledger amount or kind rejected.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Image job state change rejected.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Blob key contains characters outside the allowed set.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// Blob I/O failed.
    #[error("blob i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FaceCensorError> for StoreError {
    fn from(err: FaceCensorError) -> Self {
        match err {
            FaceCensorError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            FaceCensorError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            err @ FaceCensorError::InvalidTransition { .. } => {
                Self::InvalidTransition(err.to_string())
            }
            FaceCensorError::InvalidId(e) => Self::Serialization(e.to_string()),
        }
    }
}
