use crate::error::{Result, VisionError};

/// Axis-aligned face candidate in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRect {
    /// X coordinate of the top-left corner.
    pub x: u32,
    /// Y coordinate of the top-left corner.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detection score; higher wins during overlap suppression.
    pub score: f64,
}

impl FaceRect {
    /// Create a rectangle with a neutral score.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            score: 0.0,
        }
    }

    /// Whether the two rectangles share at least one pixel.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        let other_right = u64::from(other.x) + u64::from(other.width);
        let other_bottom = u64::from(other.y) + u64::from(other.height);

        u64::from(self.x) < other_right
            && u64::from(other.x) < right
            && u64::from(self.y) < other_bottom
            && u64::from(other.y) < bottom
    }

    /// Clip the rectangle to a `width × height` image.
    ///
    /// Returns `None` when nothing of it lies inside the image.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Self {
            width: w,
            height: h,
            ..*self
        })
    }
}

/// Tunables for the cascade detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Image pyramid step; each level is `1 / scale_factor` of the previous.
    pub scale_factor: f32,
    /// Minimum face side in pixels.
    pub min_size: u32,
    /// Minimum classifier score for a candidate to be reported.
    pub score_threshold: f64,
    /// Sliding window step in pixels, both axes.
    pub window_step: u32,
}

/// Smallest face side the cascade can classify.
pub const MIN_FACE_SIZE: u32 = 20;

impl DetectorConfig {
    /// Check every tunable against the range the cascade accepts.
    ///
    /// The pyramid steps down by `1 / scale_factor`, which must stay within
    /// `0.01..=0.99`.
    ///
    /// # Errors
    ///
    /// Returns `VisionError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let pyramid = 1.0 / self.scale_factor;
        if !self.scale_factor.is_finite() || !(0.01..=0.99).contains(&pyramid) {
            return Err(VisionError::Config(format!(
                "scale_factor {} must be between 1.0101 and 100",
                self.scale_factor
            )));
        }
        if self.min_size < MIN_FACE_SIZE {
            return Err(VisionError::Config(format!(
                "min_size {} is below {MIN_FACE_SIZE}",
                self.min_size
            )));
        }
        if !self.score_threshold.is_finite() || self.score_threshold <= 0.0 {
            return Err(VisionError::Config(format!(
                "score_threshold {} must be positive",
                self.score_threshold
            )));
        }
        if self.window_step == 0 {
            return Err(VisionError::Config("window_step must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.05,
            min_size: MIN_FACE_SIZE,
            score_threshold: 2.0,
            window_step: 4,
        }
    }
}

/// Pluggable face detection backend.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect>;
}

/// Keep the higher-scoring rectangle of every intersecting pair.
///
/// The result contains no two intersecting rectangles.
#[must_use]
pub fn suppress_overlaps(rects: Vec<FaceRect>) -> Vec<FaceRect> {
    suppress_overlaps_by(rects, |rect| *rect)
}

/// [`suppress_overlaps`] over items carrying a rectangle, compared by `key`.
#[must_use]
pub fn suppress_overlaps_by<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> FaceRect,
{
    items.sort_by(|a, b| key(b).score.total_cmp(&key(a).score));

    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let rect = key(&item);
        if kept.iter().all(|k| !key(k).intersects(&rect)) {
            kept.push(item);
        }
    }
    kept
}
