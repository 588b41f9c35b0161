//! Balance calculation over accrual and withdrawal snapshots.
//!
//! Pure arithmetic with no side effects. A breakdown computed outside the
//! author lock is a stale read, fit for display only; write paths recompute
//! inside the same critical section as the write they gate.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AccrualRecord, Amount, WithdrawalRequest};

/// Aggregate view of an author's earnings and reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceBreakdown {
    /// Sum of every accrual, regardless of approval or settlement.
    pub total_accrued: Amount,
    /// Sum of accruals already consumed by settlements.
    pub total_paid: Amount,
    /// Sum of accruals finance has blessed. Informational only.
    pub total_approved: Amount,
    /// Sum of withdrawals in any non-rejected state.
    pub total_reserved: Amount,
    /// What the author may still request: accrued minus reserved, floored
    /// at zero.
    pub available: Amount,
}

/// Compute an author's balance breakdown from ledger snapshots.
///
/// Pending and approved withdrawals count against the balance alongside paid
/// ones, so several in-flight requests can never jointly overdraw the same
/// earnings.
///
/// # Examples
/// ```
/// use backend::domain::balance;
///
/// let breakdown = balance(&[], &[]);
/// assert!(breakdown.available.is_zero());
/// ```
#[must_use]
pub fn balance(
    accruals: &[AccrualRecord],
    withdrawals: &[WithdrawalRequest],
) -> BalanceBreakdown {
    let sum = |amounts: &mut dyn Iterator<Item = Amount>| {
        amounts.fold(Amount::ZERO, Amount::saturating_add)
    };

    let total_accrued = sum(&mut accruals.iter().map(AccrualRecord::amount));
    let total_paid = sum(&mut accruals
        .iter()
        .filter(|record| record.is_paid())
        .map(AccrualRecord::amount));
    let total_approved = sum(&mut accruals
        .iter()
        .filter(|record| record.is_approved())
        .map(AccrualRecord::amount));
    let total_reserved = sum(&mut withdrawals
        .iter()
        .filter(|request| request.status().reserves_balance())
        .map(WithdrawalRequest::amount));

    BalanceBreakdown {
        total_accrued,
        total_paid,
        total_approved,
        total_reserved,
        available: total_accrued.saturating_sub(total_reserved),
    }
}
