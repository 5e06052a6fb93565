//! Common test utilities for FaceCensor integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use image::{Rgba, RgbaImage};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use facecensor_core::{AccountId, MediaType};
use facecensor_service::auth::JwtClaims;
use facecensor_service::{create_router, AppState, ServiceConfig};
use facecensor_store::{MemoryBlobStore, MemoryStore};
use facecensor_vision::{DetectorConfig, FaceDetector, FaceRect};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const ADMIN_KEY: &str = "test-admin-key";

/// Upload limit used by the harness, small enough to exceed cheaply.
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024;

/// Detector returning the same boxes for every image.
pub struct FixedDetector(pub Vec<FaceRect>);

impl FaceDetector for FixedDetector {
    fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRect> {
        self.0.clone()
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// A test user ID for authenticated requests.
    pub test_user_id: AccountId,
}

impl TestHarness {
    /// Harness whose detector finds two faces in every image.
    pub fn new() -> Self {
        Self::with_faces(vec![
            FaceRect::new(10, 10, 30, 30),
            FaceRect::new(100, 60, 30, 30),
        ])
    }

    /// Harness with a detector reporting `faces`.
    pub fn with_faces(faces: Vec<FaceRect>) -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: String::new(),
            upload_dir: String::new(),
            auth_jwt_secret: Some(JWT_SECRET.into()),
            admin_api_key: Some(ADMIN_KEY.into()),
            cors_origins: vec!["*".into()],
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_body_bytes: 4 * MAX_UPLOAD_BYTES,
            request_timeout_seconds: 30,
            welcome_bonus_credits: 1,
            face_model_path: String::new(),
            detector: DetectorConfig::default(),
        };

        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(FixedDetector(faces)),
            config,
        );
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            test_user_id: AccountId::generate(),
        }
    }

    /// Bearer token for the test user.
    pub fn user_token(&self) -> String {
        mint_token(&self.test_user_id)
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer {}", self.user_token())
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        format!("Bearer {}", mint_token(&AccountId::generate()))
    }

    /// Provision the test user's account.
    pub async fn create_account(&self) {
        self.server
            .post("/v1/accounts")
            .add_header("authorization", self.user_auth_header())
            .json(&json!({}))
            .await
            .assert_status_ok();
    }

    /// Record purchased credits for the test user via the admin endpoint.
    pub async fn add_credits(&self, amount: i64) {
        self.server
            .post("/v1/credits/add")
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "account_id": self.test_user_id.to_string(),
                "amount": amount,
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign an HS256 token for `account_id`, valid for ten minutes.
pub fn mint_token(account_id: &AccountId) -> String {
    let claims = JwtClaims {
        sub: account_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 600,
        iat: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// A 160x120 gradient encoded as `media_type`.
pub fn sample_image(media_type: MediaType) -> Vec<u8> {
    let image = RgbaImage::from_fn(160, 120, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
    });
    facecensor_vision::encode(&image, media_type).expect("Failed to encode sample")
}

/// Multipart form with a single `file` field.
pub fn upload_form(bytes: Vec<u8>, filename: &str, content_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes)
            .file_name(filename)
            .mime_type(content_type),
    )
}
