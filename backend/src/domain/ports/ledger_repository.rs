//! Port for the shared accrual and withdrawal store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{AccrualRecord, WithdrawalRequest, WithdrawalStatus};

/// Errors raised by ledger repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerRepositoryError {
    /// Repository connection could not be established.
    #[error("ledger repository connection failed: {message}")]
    Connection {
        /// Adapter-level failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("ledger repository query failed: {message}")]
    Query {
        /// Adapter-level failure description.
        message: String,
    },
}

impl LedgerRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Consistent read of one author's ledger.
///
/// Both sides are loaded inside the same transaction so balance arithmetic
/// never mixes snapshot versions.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Every accrual record for the author, any settlement state.
    pub accruals: Vec<AccrualRecord>,
    /// Every withdrawal request for the author, any status, newest first.
    pub withdrawals: Vec<WithdrawalRequest>,
}

/// Filter for administrative withdrawal listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithdrawalFilter {
    /// Restrict to one author.
    pub author_id: Option<Uuid>,
    /// Restrict to one lifecycle state.
    pub status: Option<WithdrawalStatus>,
}

/// Port for reading and mutating the royalty ledger store.
///
/// Callers provide linearisation per author; adapters provide atomicity per
/// call. In particular [`LedgerRepository::settle`] must apply the accrual
/// flips and the withdrawal status write as one transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Load one author's full ledger in a single consistent snapshot.
    async fn load_author_ledger(
        &self,
        author_id: Uuid,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError>;

    /// Persist a freshly created withdrawal request.
    async fn insert_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError>;

    /// Find a withdrawal by id.
    async fn find_withdrawal(
        &self,
        withdrawal_id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, LedgerRepositoryError>;

    /// Persist a validator decision (approval or rejection).
    async fn update_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError>;

    /// Load the author's unpaid accruals, oldest first.
    async fn unpaid_accruals(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<AccrualRecord>, LedgerRepositoryError>;

    /// Atomically mark the selected accruals paid and persist the request's
    /// PAID state. Either both writes commit or neither does.
    async fn settle(
        &self,
        request: &WithdrawalRequest,
        accrual_ids: &[Uuid],
        paid_at: DateTime<Utc>,
    ) -> Result<(), LedgerRepositoryError>;

    /// List withdrawal requests matching the filter, newest first.
    async fn list_withdrawals(
        &self,
        filter: WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, LedgerRepositoryError>;
}
