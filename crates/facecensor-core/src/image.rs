//! Image job records and accepted media types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, BlobId, FaceCensorError, ImageId, Result, CREDITS_PER_IMAGE};

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// JPEG (`image/jpeg`, also the non-standard `image/jpg`).
    Jpeg,
    /// PNG.
    Png,
    /// WebP.
    Webp,
}

impl MediaType {
    /// Every accepted type.
    pub const ALL: [Self; 3] = [Self::Jpeg, Self::Png, Self::Webp];

    /// Parse an upload's declared content type.
    ///
    /// Parameters such as `; charset=...` are ignored; matching is
    /// case-insensitive.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Canonical MIME type.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File extension used for stored artifacts.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Storage key of the original upload.
    #[must_use]
    pub fn original_key(&self, blob_id: &BlobId) -> String {
        format!("{blob_id}_orig.{}", self.extension())
    }

    /// Storage key of the censored output.
    #[must_use]
    pub fn processed_key(&self, blob_id: &BlobId) -> String {
        format!("{blob_id}_censored.{}", self.extension())
    }
}

/// Lifecycle state of an image job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// Credit charged, transform not yet finished.
    Processing,
    /// Censored artifact written.
    Done,
    /// Transform faulted; no artifact.
    Failed,
}

impl ImageStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Wire name, as used in JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Persisted record of one upload's processing lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageJob {
    /// Job ID.
    pub id: ImageId,

    /// Owning account.
    pub account_id: AccountId,

    /// Filename as supplied by the client. Display only.
    pub original_filename: String,

    /// Validated media type of the upload.
    pub media_type: MediaType,

    /// Storage key of the original bytes.
    pub original_path: String,

    /// Storage key of the censored output; `None` once the job has failed.
    pub processed_path: Option<String>,

    /// Number of regions censored.
    pub faces_detected: u32,

    /// Current lifecycle state.
    pub status: ImageStatus,

    /// Credits charged for this job.
    pub credits_used: i64,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// When the job last changed state.
    pub updated_at: DateTime<Utc>,
}

impl ImageJob {
    /// Create a job in the `processing` state for a freshly stored upload.
    #[must_use]
    pub fn processing(
        account_id: AccountId,
        blob_id: &BlobId,
        media_type: MediaType,
        original_filename: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ImageId::generate(),
            account_id,
            original_filename,
            media_type,
            original_path: media_type.original_key(blob_id),
            processed_path: Some(media_type.processed_key(blob_id)),
            faces_detected: 0,
            status: ImageStatus::Processing,
            credits_used: CREDITS_PER_IMAGE,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition `processing → done`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the job is already terminal.
    pub fn mark_done(&mut self, faces_detected: u32) -> Result<()> {
        self.ensure_processing(ImageStatus::Done)?;
        self.faces_detected = faces_detected;
        self.status = ImageStatus::Done;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition `processing → failed`, dropping the output path.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the job is already terminal.
    pub fn mark_failed(&mut self) -> Result<()> {
        self.ensure_processing(ImageStatus::Failed)?;
        self.processed_path = None;
        self.status = ImageStatus::Failed;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn ensure_processing(&self, to: ImageStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(FaceCensorError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}
