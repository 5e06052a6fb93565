//! Upload → debit → detect → pixelate → persist.
//!
//! [`Pipeline::process`] is synchronous and CPU-bound; handlers run it on
//! tokio's blocking pool. Caller faults are rejected before any write.
//! Once the credit is taken, every later fault is recorded on the job as
//! `failed` instead of being returned, and the credit is not refunded. Panics
//! inside the transform count as such faults.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use facecensor_core::{AccountId, BlobId, ImageJob, MediaType, CREDITS_PER_IMAGE};
use facecensor_store::{BlobStore, Store, StoreError};
use facecensor_vision::{censor_faces, FaceDetector, VisionError};

use crate::error::ApiError;

/// Longest filename kept for display.
const MAX_FILENAME_CHARS: usize = 255;

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied filename. Display only.
    pub filename: String,
    /// Client-declared content type.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Faults after the debit; they fail the job rather than the request.
#[derive(Debug, thiserror::Error)]
enum TransformError {
    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("stored original is missing: {0}")]
    MissingOriginal(String),

    #[error("transform panicked: {0}")]
    Panicked(String),
}

/// Orchestrates one upload against the store, blob store and detector.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
    detector: Arc<dyn FaceDetector>,
    max_upload_bytes: usize,
}

impl Pipeline {
    /// Create a pipeline over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        detector: Arc<dyn FaceDetector>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            store,
            blobs,
            detector,
            max_upload_bytes,
        }
    }

    /// Validate, charge and censor one upload.
    ///
    /// Returns the final job; callers must inspect `status`, since transform
    /// faults are reported as a `failed` job.
    ///
    /// # Errors
    ///
    /// - `UnsupportedMediaType` for content types other than JPEG, PNG, WebP.
    /// - `PayloadTooLarge` above the configured size limit.
    /// - `InsufficientCredits` when the balance cannot cover one image.
    /// - `NotFound` when the account has not been provisioned.
    pub fn process(&self, account_id: &AccountId, upload: Upload) -> Result<ImageJob, ApiError> {
        let media_type = MediaType::from_content_type(&upload.content_type)
            .ok_or_else(|| ApiError::UnsupportedMediaType(upload.content_type.clone()))?;

        if upload.bytes.len() > self.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge {
                size: Some(upload.bytes.len()),
                limit: self.max_upload_bytes,
            });
        }

        let balance = self.store.balance(account_id)?;
        if balance < CREDITS_PER_IMAGE {
            return Err(ApiError::InsufficientCredits {
                balance,
                required: CREDITS_PER_IMAGE,
            });
        }

        let blob_id = BlobId::generate();
        let mut job = ImageJob::processing(
            *account_id,
            &blob_id,
            media_type,
            display_filename(&upload.filename, media_type),
        );

        self.blobs.put(&job.original_path, &upload.bytes)?;

        // A concurrent upload may have spent the last credit since the
        // balance check; the original stays behind unreferenced.
        if let Err(e) = self.store.begin_image_job(&job) {
            tracing::warn!(
                account_id = %account_id,
                key = %job.original_path,
                error = %e,
                "Debit failed after original was stored"
            );
            return Err(e.into());
        }

        tracing::info!(
            account_id = %account_id,
            image_id = %job.id,
            media_type = media_type.mime(),
            size = upload.bytes.len(),
            "Image charged, censoring"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.transform(&job, media_type)))
            .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(&*payload))));
        let transition = match outcome {
            Ok(faces) => {
                tracing::info!(image_id = %job.id, faces, "Image censored");
                job.mark_done(faces)
            }
            Err(e) => {
                tracing::warn!(image_id = %job.id, error = %e, "Image processing failed");
                job.mark_failed()
            }
        };
        transition.map_err(|e| ApiError::Internal(e.to_string()))?;

        self.store.update_image(&job)?;
        Ok(job)
    }

    /// Detect and censor the stored original, writing the processed blob.
    fn transform(&self, job: &ImageJob, media_type: MediaType) -> Result<u32, TransformError> {
        let original = self
            .blobs
            .get(&job.original_path)?
            .ok_or_else(|| TransformError::MissingOriginal(job.original_path.clone()))?;

        let censored = censor_faces(&original, media_type, self.detector.as_ref())?;

        if let Some(processed_path) = &job.processed_path {
            self.blobs.put(processed_path, &censored.data)?;
        }
        Ok(censored.faces)
    }
}

/// Text of a panic payload raised with `panic!` or `assert!`.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Filename shown back to the user; falls back to `upload.<ext>`.
fn display_filename(filename: &str, media_type: MediaType) -> String {
    let name = filename.trim();
    if name.is_empty() {
        return format!("upload.{}", media_type.extension());
    }
    name.chars().take(MAX_FILENAME_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecensor_core::{ImageStatus, TransactionKind};
    use facecensor_store::{MemoryBlobStore, MemoryStore};
    use facecensor_vision::{encode, FaceRect};
    use image::{Rgba, RgbaImage};

    struct FixedDetector(Vec<FaceRect>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRect> {
            self.0.clone()
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        blobs: Arc<MemoryBlobStore>,
        pipeline: Pipeline,
        account_id: AccountId,
    }

    /// Detector that fails the way a misconfigured backend does.
    struct PanickingDetector;

    impl FaceDetector for PanickingDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRect> {
            panic!("Illegal min face size");
        }
    }

    fn fixture(credits: i64, faces: Vec<FaceRect>) -> Fixture {
        fixture_with(credits, Arc::new(FixedDetector(faces)))
    }

    fn fixture_with(credits: i64, detector: Arc<dyn FaceDetector>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let account_id = AccountId::generate();
        store.create_account(&account_id, credits).unwrap();

        let pipeline = Pipeline::new(store.clone(), blobs.clone(), detector, 1024 * 1024);
        Fixture {
            store,
            blobs,
            pipeline,
            account_id,
        }
    }

    fn jpeg_upload() -> Upload {
        let image = RgbaImage::from_fn(160, 120, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
        });
        Upload {
            filename: "team.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: encode(&image, MediaType::Jpeg).unwrap(),
        }
    }

    fn two_faces() -> Vec<FaceRect> {
        vec![FaceRect::new(10, 10, 30, 30), FaceRect::new(100, 60, 30, 30)]
    }

    #[test]
    fn one_credit_two_faces() {
        let fx = fixture(1, two_faces());

        let job = fx.pipeline.process(&fx.account_id, jpeg_upload()).unwrap();

        assert_eq!(job.status, ImageStatus::Done);
        assert_eq!(job.faces_detected, 2);
        assert_eq!(job.credits_used, 1);
        assert_eq!(fx.store.balance(&fx.account_id).unwrap(), 0);

        let usage: Vec<_> = fx
            .store
            .list_transactions_by_account(&fx.account_id, 10, 0)
            .unwrap()
            .into_iter()
            .filter(|tx| tx.kind == TransactionKind::Usage)
            .collect();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].delta, -1);
        assert_eq!(usage[0].description, "Face censoring: team.jpg");

        let processed = job.processed_path.as_deref().unwrap();
        assert!(processed.ends_with("_censored.jpg"));
        let bytes = fx.blobs.get(processed).unwrap().unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let stored = fx.store.get_image(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, ImageStatus::Done);
    }

    #[test]
    fn zero_credits_rejected_before_any_write() {
        let fx = fixture(0, two_faces());

        let err = fx.pipeline.process(&fx.account_id, jpeg_upload()).unwrap_err();

        assert!(matches!(
            err,
            ApiError::InsufficientCredits {
                balance: 0,
                required: 1
            }
        ));
        assert!(fx
            .store
            .list_transactions_by_account(&fx.account_id, 10, 0)
            .unwrap()
            .is_empty());
        assert!(fx
            .store
            .list_images_by_account(&fx.account_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn corrupt_bytes_fail_the_job_without_refund() {
        let fx = fixture(1, two_faces());
        let upload = Upload {
            bytes: b"\xFF\xD8\xFF\xE0 truncated garbage".to_vec(),
            ..jpeg_upload()
        };

        let job = fx.pipeline.process(&fx.account_id, upload).unwrap();

        assert_eq!(job.status, ImageStatus::Failed);
        assert!(job.processed_path.is_none());
        assert_eq!(job.faces_detected, 0);
        assert_eq!(fx.store.balance(&fx.account_id).unwrap(), 0);
        assert!(fx.blobs.exists(&job.original_path).unwrap());
    }

    #[test]
    fn detector_panic_fails_the_job() {
        let fx = fixture_with(1, Arc::new(PanickingDetector));

        let job = fx.pipeline.process(&fx.account_id, jpeg_upload()).unwrap();

        assert_eq!(job.status, ImageStatus::Failed);
        assert!(job.processed_path.is_none());
        assert_eq!(fx.store.balance(&fx.account_id).unwrap(), 0);
        let stored = fx.store.get_image(&job.id).unwrap().unwrap();
        assert_eq!(stored.status, ImageStatus::Failed);
    }

    #[test]
    fn panic_message_reads_both_payload_kinds() {
        let from_str = panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(&*from_str), "static text");

        let value = 3;
        let from_string = panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();
        assert_eq!(panic_message(&*from_string), "formatted 3");
    }

    #[test]
    fn oversized_upload_mutates_nothing() {
        let fx = fixture(1, two_faces());
        let upload = Upload {
            bytes: vec![0u8; 1024 * 1024 + 1],
            ..jpeg_upload()
        };

        let err = fx.pipeline.process(&fx.account_id, upload).unwrap_err();

        assert!(matches!(err, ApiError::PayloadTooLarge { .. }));
        assert_eq!(fx.store.balance(&fx.account_id).unwrap(), 1);
        assert!(fx
            .store
            .list_images_by_account(&fx.account_id, 10, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn media_type_checked_before_size() {
        let fx = fixture(1, two_faces());
        let upload = Upload {
            content_type: "image/gif".into(),
            bytes: vec![0u8; 1024 * 1024 + 1],
            ..jpeg_upload()
        };

        let err = fx.pipeline.process(&fx.account_id, upload).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(ref ct) if ct == "image/gif"));
    }

    #[test]
    fn unknown_account_is_not_found() {
        let fx = fixture(1, two_faces());
        let err = fx
            .pipeline
            .process(&AccountId::generate(), jpeg_upload())
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn output_keeps_input_format() {
        let fx = fixture(1, Vec::new());
        let image = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 255]));
        let upload = Upload {
            filename: "   ".into(),
            content_type: "image/png".into(),
            bytes: encode(&image, MediaType::Png).unwrap(),
        };

        let job = fx.pipeline.process(&fx.account_id, upload).unwrap();

        assert_eq!(job.status, ImageStatus::Done);
        assert_eq!(job.faces_detected, 0);
        assert_eq!(job.original_filename, "upload.png");
        let bytes = fx.blobs.get(job.processed_path.as_deref().unwrap()).unwrap().unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn concurrent_uploads_with_one_credit() {
        let fx = fixture(1, two_faces());
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let pipeline = fx.pipeline.clone();
                let account_id = fx.account_id;
                std::thread::spawn(move || pipeline.process(&account_id, jpeg_upload()))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let charged = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(charged, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ApiError::InsufficientCredits { .. })));
        assert_eq!(fx.store.balance(&fx.account_id).unwrap(), 0);
    }
}
