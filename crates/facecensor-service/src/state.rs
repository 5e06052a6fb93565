//! Application state.

use std::sync::Arc;

use facecensor_store::{BlobStore, Store};
use facecensor_vision::FaceDetector;

use crate::config::ServiceConfig;
use crate::pipeline::Pipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account, ledger and image job records.
    pub store: Arc<dyn Store>,

    /// Original and censored image bytes.
    pub blobs: Arc<dyn BlobStore>,

    /// Face detector, loaded once at startup.
    pub detector: Arc<dyn FaceDetector>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        detector: Arc<dyn FaceDetector>,
        config: ServiceConfig,
    ) -> Self {
        if config.auth_jwt_secret.is_none() {
            tracing::warn!("AUTH_JWT_SECRET not configured - user endpoints will reject all requests");
        }
        if config.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not configured - admin endpoints disabled");
        }

        Self {
            store,
            blobs,
            detector,
            config,
        }
    }

    /// Pipeline handle for one upload; cheap to clone into a blocking task.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
            Arc::clone(&self.detector),
            self.config.max_upload_bytes,
        )
    }
}
