//! FaceCensor HTTP API Service.
//!
//! This crate provides the HTTP API for FaceCensor, including:
//!
//! - Account provisioning with a welcome bonus
//! - Credit balance and transaction history
//! - Image upload, censoring and retrieval
//!
//! # Authentication
//!
//! 1. **HS256 JWT tokens** - For end-user requests. The token may also be
//!    passed as the `_t` query parameter so `<img src>` can fetch images.
//! 2. **Admin API key** - For recording purchased credits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use pipeline::{Pipeline, Upload};
pub use routes::create_router;
pub use state::AppState;
