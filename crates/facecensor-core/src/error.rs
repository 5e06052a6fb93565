//! Error types for FaceCensor.

use crate::ids::IdError;
use crate::ImageStatus;

/// Result type for FaceCensor operations.
pub type Result<T> = std::result::Result<T, FaceCensorError>;

/// Errors that can occur in FaceCensor domain operations.
#[derive(Debug, thiserror::Error)]
pub enum FaceCensorError {
    /// Insufficient credits for the operation.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Image job state change not permitted.
    #[error("invalid image transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current status.
        from: ImageStatus,
        /// The requested status.
        to: ImageStatus,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Invalid amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
