//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use facecensor_core::MediaType;

use crate::state::AppState;

/// Health check response, also advertising the upload policy.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
    /// Accepted upload content types.
    pub accepted_types: Vec<&'static str>,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "facecensor",
        version: env!("CARGO_PKG_VERSION"),
        max_upload_bytes: state.config.max_upload_bytes,
        accepted_types: MediaType::ALL.iter().map(MediaType::mime).collect(),
    })
}
