//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, credits, health, images};
use crate::state::AppState;

/// Maximum concurrent uploads; each one holds a blocking thread while
/// detection runs.
const UPLOAD_MAX_CONCURRENT_REQUESTS: usize = 8;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Accounts (JWT auth)
/// - `POST /v1/accounts` - Provision account with welcome bonus
/// - `GET /v1/accounts/me` - Get current user's account
///
/// ## Credits (JWT auth, admin key for `add`)
/// - `GET /v1/credits/balance` - Balance and recent transactions
/// - `GET /v1/credits/transactions` - List transaction history
/// - `POST /v1/credits/add` - Record purchased credits
///
/// ## Images (JWT auth, bearer header or `_t` query parameter)
/// - `POST /v1/images/upload` - Charge one credit and censor an image
/// - `GET /v1/images` - List jobs, newest first
/// - `GET /v1/images/:id` - Job summary
/// - `GET /v1/images/:id/original` - Original bytes
/// - `GET /v1/images/:id/processed` - Censored bytes
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Multipart applies axum's 2 MiB default unless overridden per route.
    let upload = post(images::upload_image)
        .layer::<_, Infallible>(DefaultBodyLimit::max(max_body_bytes))
        .layer::<_, Infallible>(ConcurrencyLimitLayer::new(UPLOAD_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/me", get(accounts::get_account))
        // Credits
        .route("/credits/balance", get(credits::get_balance))
        .route("/credits/transactions", get(credits::list_transactions))
        .route("/credits/add", post(credits::admin_add_credits))
        // Images
        .route("/images", get(images::list_images))
        .route("/images/upload", upload)
        .route("/images/:id", get(images::get_image))
        .route("/images/:id/original", get(images::get_original))
        .route("/images/:id/processed", get(images::get_processed))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
