//! Error types for detection and censoring.

use thiserror::Error;

/// Result type for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Errors raised while turning uploaded bytes into a censored image.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The decoded image has no pixels.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// The censored image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Detector tunables are outside the range the backend accepts.
    #[error("invalid detector configuration: {0}")]
    Config(String),

    /// The classifier model could not be loaded.
    #[error("failed to load face model: {0}")]
    Model(String),
}
