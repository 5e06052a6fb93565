//! Account types for FaceCensor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, FaceCensorError, Result, TransactionKind};

/// Credits granted to a newly provisioned account.
pub const DEFAULT_WELCOME_BONUS_CREDITS: i64 = 1;

/// Credits charged for processing one image.
pub const CREDITS_PER_IMAGE: i64 = 1;

/// A credit account.
///
/// The balance is only ever changed by the ledger operations in the store,
/// each of which appends a matching `CreditTransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The account ID (token subject).
    pub account_id: AccountId,

    /// Current credit balance. Never negative.
    pub credits: i64,

    /// Lifetime credits granted for free (welcome bonus).
    pub lifetime_granted: i64,

    /// Lifetime credits purchased.
    pub lifetime_purchased: i64,

    /// Lifetime credits spent on image processing.
    pub lifetime_used: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            credits: 0,
            lifetime_granted: 0,
            lifetime_purchased: 0,
            lifetime_used: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can afford a deduction.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credits >= amount
    }

    /// Add credits, bumping the lifetime counter for `kind`.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a non-positive amount or a debit kind.
    pub fn credit(&mut self, amount: i64, kind: TransactionKind) -> Result<i64> {
        if amount <= 0 {
            return Err(FaceCensorError::InvalidAmount(format!(
                "credit amount must be positive, got {amount}"
            )));
        }
        match kind {
            TransactionKind::WelcomeBonus => self.lifetime_granted += amount,
            TransactionKind::Purchase => self.lifetime_purchased += amount,
            TransactionKind::Usage => {
                return Err(FaceCensorError::InvalidAmount(
                    "usage cannot add credits".into(),
                ))
            }
        }
        self.credits += amount;
        self.updated_at = Utc::now();
        Ok(self.credits)
    }

    /// Remove credits, refusing to go below zero.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive amount.
    /// - `InsufficientCredits` if the balance is lower than `amount`.
    pub fn debit(&mut self, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(FaceCensorError::InvalidAmount(format!(
                "debit amount must be positive, got {amount}"
            )));
        }
        if !self.has_sufficient_credits(amount) {
            return Err(FaceCensorError::InsufficientCredits {
                balance: self.credits,
                required: amount,
            });
        }
        self.credits -= amount;
        self.lifetime_used += amount;
        self.updated_at = Utc::now();
        Ok(self.credits)
    }
}
