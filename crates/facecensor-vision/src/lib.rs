//! Face detection and pixelation for FaceCensor.
//!
//! [`censor_faces`] runs the whole transform on one upload: decode, detect on
//! the grayscale image, drop overlapping candidates, pixelate each remaining
//! face with padding, and encode back to the input's format.
//!
//! # Example
//!
//! ```no_run
//! use facecensor_core::MediaType;
//! use facecensor_vision::{censor_faces, DetectorConfig, RustfaceDetector};
//!
//! let detector =
//!     RustfaceDetector::from_path("model/seeta_fd_frontal_v1.0.bin", DetectorConfig::default())
//!         .unwrap();
//! let input = std::fs::read("group.jpg").unwrap();
//! let censored = censor_faces(&input, MediaType::Jpeg, &detector).unwrap();
//! println!("censored {} faces", censored.faces);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod censor;
pub mod codec;
/// Face detection traits and data types.
pub mod detector;
pub mod error;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

pub use censor::{block_size, censor, padded_region, Region};
pub use codec::{decode, encode};
pub use detector::{
    suppress_overlaps, suppress_overlaps_by, DetectorConfig, FaceDetector, FaceRect, MIN_FACE_SIZE,
};
pub use error::{Result, VisionError};
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;

use facecensor_core::MediaType;

/// Output of one censoring run.
#[derive(Debug, Clone)]
pub struct Censored {
    /// Encoded image bytes, same format as the input.
    pub data: Vec<u8>,
    /// Number of face regions pixelated.
    pub faces: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Detect and pixelate every face in `input`, re-encoding as `media_type`.
///
/// # Errors
///
/// - `VisionError::Decode` / `VisionError::ZeroDimensions` for unreadable input.
/// - `VisionError::Encode` if the output cannot be written.
pub fn censor_faces(
    input: &[u8],
    media_type: MediaType,
    detector: &dyn FaceDetector,
) -> Result<Censored> {
    let decoded = decode(input)?;
    let gray = decoded.to_luma8();
    let (width, height) = gray.dimensions();

    let candidates = detector.detect(gray.as_raw(), width, height);
    let candidate_count = candidates.len();
    // Overlaps are judged on the visible part; padding uses the detected size.
    let visible: Vec<(FaceRect, FaceRect)> = candidates
        .into_iter()
        .filter_map(|rect| rect.clamp_to(width, height).map(|clamped| (clamped, rect)))
        .collect();
    let faces: Vec<FaceRect> = suppress_overlaps_by(visible, |(clamped, _)| *clamped)
        .into_iter()
        .map(|(_, detected)| detected)
        .collect();
    tracing::debug!(candidates = candidate_count, kept = faces.len(), "Faces detected");

    let mut rgba = decoded.to_rgba8();
    let applied = censor(&mut rgba, &faces);
    let data = encode(&rgba, media_type)?;

    Ok(Censored {
        data,
        faces: applied,
        width,
        height,
    })
}
