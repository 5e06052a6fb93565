use std::io::Cursor;
use std::path::Path;

use crate::detector::{DetectorConfig, FaceDetector, FaceRect};
use crate::error::{Result, VisionError};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read once and cloned into a fresh detector per call, so one
/// instance can be shared across threads without locking.
pub struct RustfaceDetector {
    model: rustface::Model,
    config: DetectorConfig,
}

impl RustfaceDetector {
    /// Load a SeetaFace model file.
    ///
    /// # Errors
    ///
    /// - `VisionError::Config` if `config` is outside the cascade's range.
    /// - `VisionError::Model` if the file is unreadable or not a model.
    pub fn from_path<P: AsRef<Path>>(path: P, config: DetectorConfig) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| VisionError::Model(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes, config)
    }

    /// Load a SeetaFace model from memory.
    ///
    /// # Errors
    ///
    /// - `VisionError::Config` if `config` is outside the cascade's range.
    /// - `VisionError::Model` if the bytes are not a model.
    pub fn from_bytes(bytes: &[u8], config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let model =
            rustface::read_model(Cursor::new(bytes)).map_err(|e| VisionError::Model(e.to_string()))?;
        Ok(Self { model, config })
    }

    /// Active tunables.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.config.min_size);
        detector.set_score_thresh(self.config.score_threshold);
        detector.set_pyramid_scale_factor(1.0 / self.config.scale_factor);
        detector.set_slide_window_step(self.config.window_step, self.config.window_step);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                // Boxes may start left of or above the image. Overflow past
                // the right and bottom edges is kept for padding.
                let x = i64::from(bbox.x());
                let y = i64::from(bbox.y());
                let right = x + i64::from(bbox.width());
                let bottom = y + i64::from(bbox.height());
                let x0 = u32::try_from(x.max(0)).ok()?;
                let y0 = u32::try_from(y.max(0)).ok()?;
                let w = u32::try_from(right - i64::from(x0)).ok()?;
                let h = u32::try_from(bottom - i64::from(y0)).ok()?;
                Some(FaceRect {
                    score: face.score(),
                    ..FaceRect::new(x0, y0, w, h)
                })
            })
            .collect()
    }
}
