//! FaceCensor Service - HTTP API for credit-metered face censoring
//!
//! This is the main entry point for the facecensor service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use facecensor_service::{create_router, AppState, ServiceConfig};
use facecensor_store::{FsBlobStore, Store};
use facecensor_vision::FaceDetector;

type BoxError = Box<dyn std::error::Error>;

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, BoxError> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(facecensor_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn Store>, BoxError> {
    tracing::warn!("Built without rocksdb-backend - using in-memory store, data is lost on exit");
    Ok(Arc::new(facecensor_store::MemoryStore::new()))
}

#[cfg(feature = "rustface")]
fn load_detector(config: &ServiceConfig) -> Result<Arc<dyn FaceDetector>, BoxError> {
    tracing::info!(path = %config.face_model_path, "Loading face model");
    let detector =
        facecensor_vision::RustfaceDetector::from_path(&config.face_model_path, config.detector)?;
    Ok(Arc::new(detector))
}

#[cfg(not(feature = "rustface"))]
fn load_detector(_config: &ServiceConfig) -> Result<Arc<dyn FaceDetector>, BoxError> {
    Err(facecensor_vision::VisionError::Model(
        "built without a face detector backend; enable the `rustface` feature".into(),
    )
    .into())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,facecensor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FaceCensor Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        upload_dir = %config.upload_dir,
        max_upload_bytes = config.max_upload_bytes,
        welcome_bonus_credits = config.welcome_bonus_credits,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;
    let blobs = Arc::new(FsBlobStore::open(&config.upload_dir)?);
    let detector = load_detector(&config)?;

    let state = AppState::new(store, blobs, detector, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
