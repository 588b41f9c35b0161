//! Domain primitives, services, and ports for the royalty ledger.
//!
//! Purpose: define the strongly typed entities (accruals, withdrawals,
//! amounts), the pure balance and settlement calculators, and the withdrawal
//! ledger service that enforces the no-overdraft and single-pending
//! invariants. Adapters live outside this module and talk to it through the
//! traits in [`ports`].

pub mod allocator;
pub mod ports;

mod accrual;
mod author_locks;
mod balance;
mod error;
mod event;
mod ledger;
mod money;
mod withdrawal;

pub use self::accrual::{AccrualDraft, AccrualRecord, AccrualValidationError};
pub use self::allocator::{LedgerInconsistency, Settlement};
pub use self::author_locks::AuthorLocks;
pub use self::balance::{balance, BalanceBreakdown};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::event::WithdrawalEvent;
pub use self::ledger::WithdrawalLedgerService;
pub use self::money::{Amount, AmountValidationError};
pub use self::withdrawal::{
    InvalidTransition, PayoutDetails, PayoutDetailsValidationError, UnknownVariant,
    WithdrawalDraft, WithdrawalMethod, WithdrawalRequest, WithdrawalStatus,
    WithdrawalValidationError,
};

/// Convenient domain result alias.
pub type DomainResult<T> = Result<T, Error>;
