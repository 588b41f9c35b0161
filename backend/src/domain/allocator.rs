//! Settlement allocation: choosing which accruals a payout consumes.
//!
//! When a withdrawal is confirmed paid, the allocator picks the author's
//! oldest unpaid accrual records until their sum covers the payout. Records
//! are consumed whole; the final record may overshoot the payout amount
//! rather than being split, mirroring a draw-down of whole earned units.
//! The overshoot is reported so the caller can log it for reconciliation.

use uuid::Uuid;

use crate::domain::{AccrualRecord, Amount};

/// Outcome of a settlement selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Accrual records to flip to paid, oldest first.
    pub accrual_ids: Vec<Uuid>,
    /// Sum of the selected records. At least the requested amount.
    pub settled_total: Amount,
    /// How far the whole-record rule overshot the requested amount.
    pub overshoot: Amount,
}

/// Raised when the author's unpaid accruals cannot cover the payout.
///
/// Structurally impossible while the no-overdraft invariant holds; tripping
/// it means the ledger was corrupted upstream. Fatal, never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unpaid accruals total {unpaid_total} below settlement amount {requested}")]
pub struct LedgerInconsistency {
    /// Sum of every unpaid accrual considered.
    pub unpaid_total: Amount,
    /// The payout amount that could not be covered.
    pub requested: Amount,
}

/// Select the accrual records a payout of `amount` consumes.
///
/// Paid records in the input are ignored; the remainder is ordered by
/// creation time (ties broken by id so the selection is deterministic) and
/// accumulated greedily while the running sum is below `amount`.
pub fn select_for_settlement(
    accruals: &[AccrualRecord],
    amount: Amount,
) -> Result<Settlement, LedgerInconsistency> {
    let mut unpaid: Vec<&AccrualRecord> = accruals
        .iter()
        .filter(|record| !record.is_paid())
        .collect();
    unpaid.sort_by_key(|record| (record.created_at(), record.id()));

    let unpaid_total = unpaid
        .iter()
        .fold(Amount::ZERO, |sum, record| sum.saturating_add(record.amount()));
    if unpaid_total < amount {
        return Err(LedgerInconsistency {
            unpaid_total,
            requested: amount,
        });
    }

    let mut accrual_ids = Vec::new();
    let mut settled_total = Amount::ZERO;
    for record in unpaid {
        if settled_total >= amount {
            break;
        }
        accrual_ids.push(record.id());
        settled_total = settled_total.saturating_add(record.amount());
    }

    Ok(Settlement {
        accrual_ids,
        settled_total,
        overshoot: settled_total.saturating_sub(amount),
    })
}
