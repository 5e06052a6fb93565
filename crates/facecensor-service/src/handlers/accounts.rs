//! Account management handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use facecensor_core::Account;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub account_id: String,
    /// Current credit balance.
    pub credits: i64,
    /// Lifetime credits granted for free.
    pub lifetime_granted: i64,
    /// Lifetime credits purchased.
    pub lifetime_purchased: i64,
    /// Lifetime credits spent on images.
    pub lifetime_used: i64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id.to_string(),
            credits: account.credits,
            lifetime_granted: account.lifetime_granted,
            lifetime_purchased: account.lifetime_purchased,
            lifetime_used: account.lifetime_used,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Provision the caller's account with the welcome bonus.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .create_account(&auth.account_id, state.config.welcome_bonus_credits)?;

    tracing::info!(
        account_id = %auth.account_id,
        welcome_bonus = state.config.welcome_bonus_credits,
        "Account created"
    );

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}
