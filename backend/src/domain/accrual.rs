//! Royalty accrual records.
//!
//! An accrual is one unit of royalty earned by an author from one sale of one
//! work. Records are produced by the external sales pipeline and are
//! append-only from the ledger's point of view; the only mutation the engine
//! performs is the settlement flip to `paid`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::Amount;

/// Unvalidated accrual fields, typically decoded from storage.
#[derive(Debug, Clone)]
pub struct AccrualDraft {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Work the royalty was earned on. Label only; never used in arithmetic.
    pub work_id: Option<Uuid>,
    pub amount: Amount,
    pub approved: bool,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Validation failures raised when constructing an [`AccrualRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccrualValidationError {
    /// Accrual amounts must be strictly positive.
    #[error("accrual amount must be greater than zero")]
    ZeroAmount,
    /// A paid record must carry its settlement timestamp.
    #[error("paid accrual is missing paid_at")]
    PaidWithoutTimestamp,
    /// An unpaid record must not carry a settlement timestamp.
    #[error("unpaid accrual carries paid_at")]
    UnpaidWithTimestamp,
}

/// One royalty unit earned by one author.
///
/// ## Invariants
/// - `amount` is strictly positive.
/// - `paid` and `paid_at` are set together; once paid, a record is immutable
///   and consumed by at most one withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualRecord {
    id: Uuid,
    author_id: Uuid,
    work_id: Option<Uuid>,
    amount: Amount,
    approved: bool,
    paid: bool,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl AccrualRecord {
    /// Validate a draft into an accrual record.
    pub fn new(draft: AccrualDraft) -> Result<Self, AccrualValidationError> {
        if draft.amount.is_zero() {
            return Err(AccrualValidationError::ZeroAmount);
        }
        match (draft.paid, draft.paid_at) {
            (true, None) => return Err(AccrualValidationError::PaidWithoutTimestamp),
            (false, Some(_)) => return Err(AccrualValidationError::UnpaidWithTimestamp),
            _ => {}
        }

        Ok(Self {
            id: draft.id,
            author_id: draft.author_id,
            work_id: draft.work_id,
            amount: draft.amount,
            approved: draft.approved,
            paid: draft.paid,
            paid_at: draft.paid_at,
            created_at: draft.created_at,
        })
    }

    /// Record identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Author who earned the royalty.
    #[must_use]
    pub const fn author_id(&self) -> Uuid {
        self.author_id
    }

    /// Work the royalty was earned on, when recorded.
    #[must_use]
    pub const fn work_id(&self) -> Option<Uuid> {
        self.work_id
    }

    /// Royalty amount.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Whether finance has blessed this accrual. Informational; balance
    /// arithmetic does not gate on it.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approved
    }

    /// Whether a settlement has consumed this record.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid
    }

    /// Settlement timestamp, once paid.
    #[must_use]
    pub const fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Earning timestamp; settlement consumes records in this order.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for accrual validation.

    use rstest::rstest;

    use super::*;

    fn draft(amount: i64) -> AccrualDraft {
        AccrualDraft {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            work_id: None,
            amount: Amount::new(amount).expect("valid amount"),
            approved: false,
            paid: false,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn accepts_positive_unpaid_record() {
        let record = AccrualRecord::new(draft(1_000)).expect("valid accrual");
        assert!(!record.is_paid());
        assert_eq!(record.amount().minor_units(), 1_000);
    }

    #[rstest]
    fn rejects_zero_amount() {
        let err = AccrualRecord::new(draft(0)).expect_err("zero amount rejected");
        assert_eq!(err, AccrualValidationError::ZeroAmount);
    }

    #[rstest]
    fn rejects_paid_record_without_timestamp() {
        let mut paid = draft(1_000);
        paid.paid = true;
        let err = AccrualRecord::new(paid).expect_err("missing paid_at rejected");
        assert_eq!(err, AccrualValidationError::PaidWithoutTimestamp);
    }

    #[rstest]
    fn rejects_unpaid_record_with_timestamp() {
        let mut unpaid = draft(1_000);
        unpaid.paid_at = Some(Utc::now());
        let err = AccrualRecord::new(unpaid).expect_err("stray paid_at rejected");
        assert_eq!(err, AccrualValidationError::UnpaidWithTimestamp);
    }
}
