//! Request and response types mirroring the FaceCensor API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use facecensor_core::{ImageStatus, TransactionKind};

/// Account with lifetime counters.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Account ID (UUID).
    pub account_id: String,
    /// Current credit balance.
    pub credits: i64,
    /// Lifetime credits granted for free.
    pub lifetime_granted: i64,
    /// Lifetime credits purchased.
    pub lifetime_purchased: i64,
    /// Lifetime credits spent.
    pub lifetime_used: i64,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
}

/// One ledger entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: String,
    /// Signed change.
    pub delta: i64,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Balance after this transaction.
    pub balance_after: i64,
    /// Description.
    pub description: String,
    /// Extra context; for usage, the charged `image_id`.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Timestamp.
    pub created_at: DateTime<Utc>,
}

/// Balance with the most recent transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    /// Current credit balance.
    pub credits: i64,
    /// Up to 20 transactions, newest first.
    pub transactions: Vec<Transaction>,
}

/// A page of transaction history.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    /// Transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Whether another page follows.
    pub has_more: bool,
}

/// Image job summary.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageJob {
    /// Job ID.
    pub id: String,
    /// Filename as uploaded.
    pub original_filename: String,
    /// MIME type of both artifacts.
    pub media_type: String,
    /// Number of regions censored.
    pub faces_detected: u32,
    /// Lifecycle state.
    pub status: ImageStatus,
    /// Credits charged.
    pub credits_used: i64,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
    /// Whether the censored artifact can be downloaded.
    pub has_processed: bool,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ApiErrorBody {
    pub(crate) fn detail_i64(&self, key: &str) -> Option<i64> {
        self.details
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(serde_json::Value::as_i64)
    }

    pub(crate) fn detail_str(&self, key: &str) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(serde_json::Value::as_str)
    }
}
