//! Client error types.

/// Errors that can occur when using the FaceCensor client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Account or image not found (or not owned by the caller).
    #[error("not found: {message}")]
    NotFound {
        /// Server message.
        message: String,
    },

    /// Upload type was not JPEG, PNG or WebP.
    #[error("unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// Content type as the server saw it.
        content_type: String,
    },

    /// Upload exceeded the server's size limit.
    #[error("payload too large (limit {limit} bytes)")]
    PayloadTooLarge {
        /// Server limit in bytes.
        limit: u64,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
