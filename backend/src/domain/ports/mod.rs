//! Domain ports and supporting types for the hexagonal boundary.

mod ledger_repository;
mod notifier;
mod withdrawal_service;

pub use ledger_repository::{
    LedgerRepository, LedgerRepositoryError, LedgerSnapshot, WithdrawalFilter,
};
pub use notifier::{LedgerNotifier, NoopNotifier, NotifierError};
pub use withdrawal_service::{
    AuthorWithdrawals, RequestWithdrawal, StatusCounts, WithdrawalCommand, WithdrawalQuery,
    WithdrawalReview,
};

#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
#[cfg(test)]
pub use notifier::MockLedgerNotifier;
#[cfg(test)]
pub use withdrawal_service::{MockWithdrawalCommand, MockWithdrawalQuery};
