//! Driving ports for the withdrawal ledger use-cases.
//!
//! HTTP handlers depend on these traits rather than on the concrete service
//! so they stay testable without storage.

use async_trait::async_trait;
use uuid::Uuid;

use super::WithdrawalFilter;
use crate::domain::{
    Amount, BalanceBreakdown, Error, PayoutDetails, WithdrawalRequest, WithdrawalStatus,
};

/// Parameters for creating a withdrawal request.
#[derive(Debug, Clone)]
pub struct RequestWithdrawal {
    /// Author asking for the payout.
    pub author_id: Uuid,
    /// Requested amount; must be positive and at or above the configured
    /// minimum.
    pub amount: Amount,
    /// Payout coordinates; the variant fixes the required fields.
    pub details: PayoutDetails,
    /// Free-form note attached by the author.
    pub notes: Option<String>,
}

/// An author's withdrawals alongside their balance breakdown.
#[derive(Debug, Clone)]
pub struct AuthorWithdrawals {
    /// The author's requests, newest first.
    pub withdrawals: Vec<WithdrawalRequest>,
    /// Balance computed from the same snapshot as the listing.
    pub balance: BalanceBreakdown,
}

/// Per-status tallies for the administrative review screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub paid: usize,
    pub rejected: usize,
}

impl StatusCounts {
    /// Tally a slice of withdrawal requests.
    #[must_use]
    pub fn tally(withdrawals: &[WithdrawalRequest]) -> Self {
        withdrawals
            .iter()
            .fold(Self::default(), |mut counts, request| {
                match request.status() {
                    WithdrawalStatus::Pending => counts.pending += 1,
                    WithdrawalStatus::Approved => counts.approved += 1,
                    WithdrawalStatus::Paid => counts.paid += 1,
                    WithdrawalStatus::Rejected => counts.rejected += 1,
                }
                counts
            })
    }
}

/// Administrative listing with per-status tallies.
#[derive(Debug, Clone)]
pub struct WithdrawalReview {
    /// Matching requests, newest first.
    pub withdrawals: Vec<WithdrawalRequest>,
    /// Tallies across the matching requests.
    pub counts: StatusCounts,
}

/// Driving port for withdrawal mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalCommand: Send + Sync {
    /// Create a PENDING withdrawal request, enforcing the minimum amount,
    /// single-pending and no-overdraft invariants atomically.
    async fn request_withdrawal(
        &self,
        request: RequestWithdrawal,
    ) -> Result<WithdrawalRequest, Error>;

    /// Approve a pending request.
    async fn approve(
        &self,
        withdrawal_id: Uuid,
        validator_id: Uuid,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error>;

    /// Reject a pending request with a mandatory reason.
    async fn reject(
        &self,
        withdrawal_id: Uuid,
        validator_id: Uuid,
        reason: String,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error>;

    /// Mark an approved request paid, settling accruals in the same atomic
    /// unit. Called only after the external payment rail has confirmed.
    async fn mark_paid(
        &self,
        withdrawal_id: Uuid,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error>;
}

/// Driving port for withdrawal and balance reads.
///
/// Read-only and safe to call outside any lock; results are display-grade
/// snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WithdrawalQuery: Send + Sync {
    /// The author's balance breakdown.
    async fn available(&self, author_id: Uuid) -> Result<BalanceBreakdown, Error>;

    /// The author's withdrawals plus balance, optionally filtered by status.
    async fn list_for_author(
        &self,
        author_id: Uuid,
        status: Option<WithdrawalStatus>,
    ) -> Result<AuthorWithdrawals, Error>;

    /// Administrative listing across authors with per-status tallies.
    async fn list_all(&self, filter: WithdrawalFilter) -> Result<WithdrawalReview, Error>;
}
