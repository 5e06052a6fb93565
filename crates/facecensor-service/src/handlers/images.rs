//! Image upload and retrieval handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use facecensor_core::{AccountId, ImageId, ImageJob, ImageStatus, MediaType};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::credits::PageQuery;
use crate::pipeline::Upload;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Image job as returned to clients.
#[derive(Debug, Serialize)]
pub struct JobSummary {
    /// Job ID.
    pub id: String,
    /// Filename as uploaded.
    pub original_filename: String,
    /// Canonical MIME type of both artifacts.
    pub media_type: &'static str,
    /// Number of regions censored.
    pub faces_detected: u32,
    /// Lifecycle state.
    pub status: ImageStatus,
    /// Credits charged.
    pub credits_used: i64,
    /// Created timestamp.
    pub created_at: String,
    /// Last state change.
    pub updated_at: String,
    /// Whether the censored artifact can be downloaded right now.
    pub has_processed: bool,
}

impl JobSummary {
    /// Build a summary, checking the blob store for the processed artifact.
    fn build(state: &AppState, job: &ImageJob) -> Result<Self, ApiError> {
        let has_processed = match (&job.status, &job.processed_path) {
            (ImageStatus::Done, Some(path)) => state.blobs.exists(path)?,
            _ => false,
        };

        Ok(Self {
            id: job.id.to_string(),
            original_filename: job.original_filename.clone(),
            media_type: job.media_type.mime(),
            faces_detected: job.faces_detected,
            status: job.status,
            credits_used: job.credits_used,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
            has_processed,
        })
    }
}

/// Body-limit rejections surface as 413; the received size is unknown.
fn multipart_error(err: &MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge { size: None, limit };
    }
    ApiError::BadRequest(err.body_text())
}

/// Pull the `file` field out of the form, skipping any others.
async fn read_upload(multipart: &mut Multipart, limit: usize) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e, limit))?;

        return Ok(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

/// `POST /v1/images/upload`
///
/// Charges one credit and censors the upload. A transform fault still
/// answers 200 with a `failed` job.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<JobSummary>, ApiError> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;

    let pipeline = state.pipeline();
    let account_id = auth.account_id;
    let job = tokio::task::spawn_blocking(move || pipeline.process(&account_id, upload))
        .await
        .map_err(|e| ApiError::Internal(format!("censor task failed: {e}")))??;

    Ok(Json(JobSummary::build(&state, &job)?))
}

/// `GET /v1/images`, newest first.
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<JobSummary>>, ApiError> {
    let jobs = state.store.list_images_by_account(
        &auth.account_id,
        query.capped_limit(),
        query.offset,
    )?;

    let summaries = jobs
        .iter()
        .map(|job| JobSummary::build(&state, job))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(summaries))
}

/// Load a job owned by `account_id`; foreign and unknown jobs look the same.
fn owned_job(state: &AppState, account_id: &AccountId, id: &str) -> Result<ImageJob, ApiError> {
    let not_found = || ApiError::NotFound("Image not found".into());
    let image_id: ImageId = id.parse().map_err(|_| not_found())?;

    state
        .store
        .get_image(&image_id)?
        .filter(|job| job.account_id == *account_id)
        .ok_or_else(not_found)
}

/// `GET /v1/images/{id}`
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JobSummary>, ApiError> {
    let job = owned_job(&state, &auth.account_id, &id)?;
    Ok(Json(JobSummary::build(&state, &job)?))
}

fn image_bytes(state: &AppState, key: Option<&str>, media_type: MediaType) -> Result<Response, ApiError> {
    let bytes = key
        .map(|key| state.blobs.get(key))
        .transpose()?
        .flatten()
        .ok_or_else(|| ApiError::NotFound("Image file not found".into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, media_type.mime()),
            (header::CACHE_CONTROL, "private, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}

/// `GET /v1/images/{id}/original`
pub async fn get_original(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = owned_job(&state, &auth.account_id, &id)?;
    image_bytes(&state, Some(&job.original_path), job.media_type)
}

/// `GET /v1/images/{id}/processed`
pub async fn get_processed(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = owned_job(&state, &auth.account_id, &id)?;
    if job.status != ImageStatus::Done {
        return Err(ApiError::NotFound("Processed image not available".into()));
    }
    image_bytes(&state, job.processed_path.as_deref(), job.media_type)
}
