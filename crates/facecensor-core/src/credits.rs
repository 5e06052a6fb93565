//! Credit transaction types for FaceCensor.
//!
//! Every change to an account balance creates one append-only transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, ImageId, TransactionId, CREDITS_PER_IMAGE};

/// A credit transaction representing a balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The account whose balance was affected.
    pub account_id: AccountId,

    /// Signed credit delta. Positive = credit, negative = debit.
    pub delta: i64,

    /// Kind of transaction.
    pub kind: TransactionKind,

    /// Balance after this transaction.
    pub balance_after: i64,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (e.g. the image the usage was charged for).
    pub metadata: serde_json::Value,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a transaction of the given kind.
    ///
    /// The delta is signed from `kind`: debits are always negative.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        amount: i64,
        kind: TransactionKind,
        balance_after: i64,
        description: String,
    ) -> Self {
        let delta = if kind.is_debit() {
            -amount.abs()
        } else {
            amount.abs()
        };
        Self {
            id: TransactionId::generate(),
            account_id,
            delta,
            kind,
            balance_after,
            description,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create the welcome bonus granted on account creation.
    #[must_use]
    pub fn welcome_bonus(account_id: AccountId, amount: i64) -> Self {
        let noun = if amount == 1 { "credit" } else { "credits" };
        Self::new(
            account_id,
            amount,
            TransactionKind::WelcomeBonus,
            amount,
            format!("Welcome bonus: {amount} free censor {noun}"),
        )
    }

    /// Create the usage transaction charged for one image.
    #[must_use]
    pub fn image_usage(
        account_id: AccountId,
        image_id: ImageId,
        balance_after: i64,
        filename: &str,
    ) -> Self {
        let mut tx = Self::new(
            account_id,
            CREDITS_PER_IMAGE,
            TransactionKind::Usage,
            balance_after,
            format!("Face censoring: {filename}"),
        );
        tx.metadata = serde_json::json!({ "image_id": image_id.to_string() });
        tx
    }
}

/// Kind of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Free credits granted when the account is created.
    WelcomeBonus,

    /// Credits bought by the account holder.
    Purchase,

    /// Credits spent on processing an image.
    Usage,
}

impl TransactionKind {
    /// Check if this kind adds credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::WelcomeBonus | Self::Purchase)
    }

    /// Check if this kind removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Usage)
    }

    /// Wire name, as used in JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WelcomeBonus => "welcome_bonus",
            Self::Purchase => "purchase",
            Self::Usage => "usage",
        }
    }
}
