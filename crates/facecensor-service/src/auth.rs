//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - End-user authentication via HS256 JWT
//! - `AdminAuth` - Admin authentication for privileged endpoints
//!
//! Tokens are issued by an external identity service sharing
//! `AUTH_JWT_SECRET`; the `sub` claim carries the account UUID.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use facecensor_core::AccountId;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameter carrying the token for `<img src>` requests.
pub const TOKEN_QUERY_PARAM: &str = "_t";

/// An authenticated user extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account the token was issued for.
    pub account_id: AccountId,
}

/// JWT claims accepted by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (account UUID).
    pub sub: String,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    #[serde(rename = "_t")]
    token: Option<String>,
}

/// Pull the raw token from the `Authorization` header, then the `_t` query
/// parameter.
fn extract_token(parts: &Parts) -> Option<String> {
    let header_token = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    header_token.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.token)
    })
}

/// Validate a token's signature and expiry, returning its claims.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` for any invalid token.
pub fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;
    Ok(token_data.claims)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(ApiError::Unauthorized)?;

        let secret = state.config.auth_jwt_secret.as_deref().ok_or_else(|| {
            tracing::warn!("AUTH_JWT_SECRET not configured - rejecting request");
            ApiError::Unauthorized
        })?;

        let claims = validate_token(&token, secret)?;
        let account_id = claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser { account_id })
    }
}

/// Admin authentication via API key.
///
/// Used for admin-only endpoints like adding credits manually.
/// Requires the `X-Admin-Key` header to match the configured admin key.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin_key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .admin_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if admin_key != expected_key {
            return Err(ApiError::Unauthorized);
        }

        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin authenticated");

        Ok(AdminAuth { admin_id })
    }
}
