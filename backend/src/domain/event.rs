//! Audit events emitted on withdrawal state transitions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Amount, WithdrawalRequest, WithdrawalStatus};

/// One withdrawal state transition, pushed to the audit sink after commit.
///
/// `from_status` is absent for the creation event, where the request springs
/// into existence as PENDING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalEvent {
    pub withdrawal_id: Uuid,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<WithdrawalStatus>,
    pub to_status: WithdrawalStatus,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

impl WithdrawalEvent {
    /// Event for a freshly created request.
    #[must_use]
    pub fn created(request: &WithdrawalRequest, occurred_at: DateTime<Utc>) -> Self {
        Self {
            withdrawal_id: request.id(),
            author_id: request.author_id(),
            from_status: None,
            to_status: request.status(),
            amount: request.amount(),
            occurred_at,
        }
    }

    /// Event for a transition out of `from` into the request's current state.
    #[must_use]
    pub fn transitioned(
        request: &WithdrawalRequest,
        from: WithdrawalStatus,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            withdrawal_id: request.id(),
            author_id: request.author_id(),
            from_status: Some(from),
            to_status: request.status(),
            amount: request.amount(),
            occurred_at,
        }
    }
}
