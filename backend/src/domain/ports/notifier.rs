//! Port for the notifier/audit sink collaborator.

use async_trait::async_trait;

use crate::domain::WithdrawalEvent;

/// Errors raised by notifier adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifierError {
    /// The event could not be handed to the sink.
    #[error("event delivery failed: {message}")]
    Delivery {
        /// Adapter-level failure description.
        message: String,
    },
}

impl NotifierError {
    /// Create a delivery error with the given message.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

/// Port for pushing withdrawal transition events to the audit sink.
///
/// Delivery is fire-and-forget: the ledger commits first, then notifies, and
/// a delivery failure never rolls back or surfaces from the triggering
/// operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerNotifier: Send + Sync {
    /// Push one transition event.
    async fn notify(&self, event: WithdrawalEvent) -> Result<(), NotifierError>;
}

/// Sink that drops every event, for deployments without an audit collaborator
/// and for tests that do not assert on notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl LedgerNotifier for NoopNotifier {
    async fn notify(&self, _event: WithdrawalEvent) -> Result<(), NotifierError> {
        Ok(())
    }
}
