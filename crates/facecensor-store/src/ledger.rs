//! Balance arithmetic shared by the store backends.
//!
//! Each helper mutates an in-memory `Account` and returns the transaction to
//! append; the caller persists both in a single write.

use facecensor_core::{Account, CreditTransaction, ImageJob, ImageStatus, TransactionKind};

use crate::error::{Result, StoreError};

pub(crate) fn credit_entry(
    account: &mut Account,
    amount: i64,
    kind: TransactionKind,
    description: &str,
) -> Result<CreditTransaction> {
    let balance = account.credit(amount, kind)?;
    Ok(CreditTransaction::new(
        account.account_id,
        amount,
        kind,
        balance,
        description.to_string(),
    ))
}

pub(crate) fn debit_entry(
    account: &mut Account,
    amount: i64,
    kind: TransactionKind,
    description: &str,
) -> Result<CreditTransaction> {
    if !kind.is_debit() {
        return Err(StoreError::InvalidAmount(format!(
            "{} cannot remove credits",
            kind.as_str()
        )));
    }
    let balance = account.debit(amount)?;
    Ok(CreditTransaction::new(
        account.account_id,
        amount,
        kind,
        balance,
        description.to_string(),
    ))
}

pub(crate) fn usage_entry(account: &mut Account, job: &ImageJob) -> Result<CreditTransaction> {
    if job.status != ImageStatus::Processing {
        return Err(StoreError::InvalidTransition(format!(
            "new image job must be processing, got {}",
            job.status.as_str()
        )));
    }
    let balance = account.debit(job.credits_used)?;
    Ok(CreditTransaction::image_usage(
        account.account_id,
        job.id,
        balance,
        &job.original_filename,
    ))
}

/// Check that `next` may replace `stored`.
pub(crate) fn check_image_update(stored: &ImageJob, next: &ImageJob) -> Result<()> {
    if stored.account_id != next.account_id {
        return Err(StoreError::InvalidTransition(format!(
            "image {} cannot change owner",
            stored.id
        )));
    }
    if stored.status.is_terminal() {
        return Err(StoreError::InvalidTransition(format!(
            "image {} is already {}",
            stored.id,
            stored.status.as_str()
        )));
    }
    Ok(())
}

pub(crate) fn account_not_found(account: &impl std::fmt::Display) -> StoreError {
    StoreError::NotFound {
        entity: "account",
        id: account.to_string(),
    }
}
