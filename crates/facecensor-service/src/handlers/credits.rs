//! Credit balance and transaction handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use facecensor_core::{AccountId, CreditTransaction, TransactionKind};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Transactions embedded in the balance response.
const BALANCE_RECENT_TRANSACTIONS: usize = 20;

/// Upper bound for `limit` on list endpoints.
pub const MAX_PAGE_SIZE: usize = 100;

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Signed change (positive = credit, negative = debit).
    pub delta: i64,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Description.
    pub description: String,
    /// Extra context (e.g. the image charged for).
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            delta: tx.delta,
            kind: tx.kind,
            balance_after: tx.balance_after,
            description: tx.description.clone(),
            metadata: tx.metadata.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current credit balance.
    pub credits: i64,
    /// Most recent transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let transactions = state
        .store
        .list_transactions_by_account(&auth.account_id, BALANCE_RECENT_TRANSACTIONS, 0)?;

    Ok(Json(BalanceResponse {
        credits: account.credits,
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
    }))
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum number of items to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl PageQuery {
    /// Requested limit, capped at [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_PAGE_SIZE)
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Verify account exists
    state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.capped_limit();
    let transactions =
        state
            .store
            .list_transactions_by_account(&auth.account_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Admin add credits request, recording a settled purchase.
#[derive(Debug, Deserialize)]
pub struct AdminAddCreditsRequest {
    /// Account to credit.
    pub account_id: String,
    /// Number of credits.
    pub amount: i64,
    /// Ledger description (default: "Credit purchase").
    #[serde(default)]
    pub description: Option<String>,
}

/// Admin add credits response.
#[derive(Debug, Serialize)]
pub struct AdminAddCreditsResponse {
    /// Balance after the purchase.
    pub credits: i64,
    /// The recorded transaction.
    pub transaction_id: String,
}

/// Admin endpoint to record purchased credits.
pub async fn admin_add_credits(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<AdminAddCreditsRequest>,
) -> Result<Json<AdminAddCreditsResponse>, ApiError> {
    let account_id: AccountId = body
        .account_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid account ID".into()))?;

    let description = body
        .description
        .unwrap_or_else(|| format!("Credit purchase: {} credits", body.amount));

    let tx = state.store.add_credits(
        &account_id,
        body.amount,
        TransactionKind::Purchase,
        &description,
    )?;

    tracing::info!(
        account_id = %account_id,
        admin_id = %admin.admin_id,
        amount = body.amount,
        new_balance = tx.balance_after,
        "Credits added"
    );

    Ok(Json(AdminAddCreditsResponse {
        credits: tx.balance_after,
        transaction_id: tx.id.to_string(),
    }))
}
