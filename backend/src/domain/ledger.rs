//! Withdrawal ledger domain service.
//!
//! Implements the withdrawal driving ports over the ledger repository,
//! enforcing the single-pending and no-overdraft invariants inside a
//! per-author critical section, and settling accruals when a payout is
//! confirmed. Transition events go to the audit sink only after the store
//! write commits, so a delivery failure can never roll back a financial
//! state change.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::allocator::select_for_settlement;
use crate::domain::ports::{
    AuthorWithdrawals, LedgerNotifier, LedgerRepository, LedgerRepositoryError,
    RequestWithdrawal, StatusCounts, WithdrawalCommand, WithdrawalFilter, WithdrawalQuery,
    WithdrawalReview,
};
use crate::domain::{
    balance, Amount, BalanceBreakdown, Error, WithdrawalEvent, WithdrawalRequest,
    WithdrawalStatus,
};

fn map_repository_error(error: LedgerRepositoryError) -> Error {
    match error {
        LedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerRepositoryError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
    }
}

/// Withdrawal ledger service implementing the command and query ports.
#[derive(Clone)]
pub struct WithdrawalLedgerService<R, N> {
    ledger_repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    locks: Arc<crate::domain::AuthorLocks>,
    minimum_withdrawal: Amount,
}

impl<R, N> WithdrawalLedgerService<R, N> {
    /// Create a new service over the given repository and audit sink.
    pub fn new(
        ledger_repo: Arc<R>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        minimum_withdrawal: Amount,
    ) -> Self {
        Self {
            ledger_repo,
            notifier,
            clock,
            locks: Arc::new(crate::domain::AuthorLocks::new()),
            minimum_withdrawal,
        }
    }
}

impl<R, N> WithdrawalLedgerService<R, N>
where
    R: LedgerRepository,
    N: LedgerNotifier,
{
    /// Push an event to the audit sink, swallowing delivery failures.
    async fn emit(&self, event: WithdrawalEvent) {
        if let Err(err) = self.notifier.notify(event).await {
            warn!(error = %err, "withdrawal event delivery failed");
        }
    }

    /// Fetch a withdrawal or fail with a not-found error.
    async fn require_withdrawal(
        &self,
        withdrawal_id: Uuid,
    ) -> Result<WithdrawalRequest, Error> {
        self.ledger_repo
            .find_withdrawal(withdrawal_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("withdrawal {withdrawal_id} not found")))
    }

    fn validate_request(&self, request: &RequestWithdrawal) -> Result<(), Error> {
        if request.amount.is_zero() {
            return Err(Error::invalid_request(
                "withdrawal amount must be greater than zero",
            ));
        }
        if request.amount < self.minimum_withdrawal {
            return Err(Error::invalid_request(format!(
                "minimum withdrawal amount is {}",
                self.minimum_withdrawal
            ))
            .with_details(json!({
                "minimumWithdrawal": self.minimum_withdrawal.minor_units(),
            })));
        }
        request.details.validate().map_err(|err| {
            let crate::domain::PayoutDetailsValidationError::EmptyField { field } = err;
            Error::invalid_request(format!("required payout field is empty: {field}"))
                .with_details(json!({ "field": field }))
        })
    }
}

#[async_trait]
impl<R, N> WithdrawalCommand for WithdrawalLedgerService<R, N>
where
    R: LedgerRepository,
    N: LedgerNotifier,
{
    async fn request_withdrawal(
        &self,
        request: RequestWithdrawal,
    ) -> Result<WithdrawalRequest, Error> {
        self.validate_request(&request)?;

        let created = {
            // Balance read and insert form one critical section per author;
            // without it two concurrent requests could both pass the
            // overdraft check against the same snapshot.
            let _guard = self.locks.lock(request.author_id).await;

            let snapshot = self
                .ledger_repo
                .load_author_ledger(request.author_id)
                .await
                .map_err(map_repository_error)?;

            if snapshot
                .withdrawals
                .iter()
                .any(|existing| existing.status() == WithdrawalStatus::Pending)
            {
                return Err(Error::conflict(
                    "a withdrawal request is already in progress for this author",
                ));
            }

            let breakdown = balance(&snapshot.accruals, &snapshot.withdrawals);
            if request.amount > breakdown.available {
                return Err(Error::insufficient_balance(format!(
                    "requested {} exceeds available balance {}",
                    request.amount, breakdown.available
                ))
                .with_details(json!({
                    "availableBalance": breakdown.available.minor_units(),
                })));
            }

            let created = WithdrawalRequest::pending(
                request.author_id,
                request.amount,
                request.details,
                self.clock.utc(),
                request.notes,
            )
            .map_err(|err| Error::internal(format!("invalid withdrawal draft: {err}")))?;

            self.ledger_repo
                .insert_withdrawal(&created)
                .await
                .map_err(map_repository_error)?;
            created
        };

        info!(
            withdrawal_id = %created.id(),
            author_id = %created.author_id(),
            amount = created.amount().minor_units(),
            method = %created.method(),
            "withdrawal requested"
        );
        self.emit(WithdrawalEvent::created(&created, self.clock.utc()))
            .await;
        Ok(created)
    }

    async fn approve(
        &self,
        withdrawal_id: Uuid,
        validator_id: Uuid,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error> {
        let existing = self.require_withdrawal(withdrawal_id).await?;

        let (approved, from) = {
            let _guard = self.locks.lock(existing.author_id()).await;
            // Re-read inside the critical section; the state may have moved
            // while we were waiting for the lock.
            let mut request = self.require_withdrawal(withdrawal_id).await?;
            let from = request.status();
            request
                .approve(validator_id, self.clock.utc(), notes)
                .map_err(|err| Error::invalid_state(err.to_string()))?;
            self.ledger_repo
                .update_withdrawal(&request)
                .await
                .map_err(map_repository_error)?;
            (request, from)
        };

        info!(
            withdrawal_id = %approved.id(),
            author_id = %approved.author_id(),
            validator_id = %validator_id,
            "withdrawal approved"
        );
        self.emit(WithdrawalEvent::transitioned(
            &approved,
            from,
            self.clock.utc(),
        ))
        .await;
        Ok(approved)
    }

    async fn reject(
        &self,
        withdrawal_id: Uuid,
        validator_id: Uuid,
        reason: String,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error> {
        if reason.trim().is_empty() {
            return Err(Error::invalid_request("rejection reason must not be empty"));
        }
        let existing = self.require_withdrawal(withdrawal_id).await?;

        let (rejected, from) = {
            let _guard = self.locks.lock(existing.author_id()).await;
            let mut request = self.require_withdrawal(withdrawal_id).await?;
            let from = request.status();
            request
                .reject(validator_id, reason, self.clock.utc(), notes)
                .map_err(|err| Error::invalid_state(err.to_string()))?;
            self.ledger_repo
                .update_withdrawal(&request)
                .await
                .map_err(map_repository_error)?;
            (request, from)
        };

        info!(
            withdrawal_id = %rejected.id(),
            author_id = %rejected.author_id(),
            validator_id = %validator_id,
            "withdrawal rejected"
        );
        self.emit(WithdrawalEvent::transitioned(
            &rejected,
            from,
            self.clock.utc(),
        ))
        .await;
        Ok(rejected)
    }

    async fn mark_paid(
        &self,
        withdrawal_id: Uuid,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest, Error> {
        let existing = self.require_withdrawal(withdrawal_id).await?;

        let (paid, from, overshoot) = {
            let _guard = self.locks.lock(existing.author_id()).await;
            let mut request = self.require_withdrawal(withdrawal_id).await?;
            let from = request.status();
            if from != WithdrawalStatus::Approved {
                return Err(Error::invalid_state(format!(
                    "only approved withdrawals can be marked paid, found {from}"
                )));
            }

            let unpaid = self
                .ledger_repo
                .unpaid_accruals(request.author_id())
                .await
                .map_err(map_repository_error)?;
            let settlement =
                select_for_settlement(&unpaid, request.amount()).map_err(|err| {
                    // The no-overdraft invariant should make this unreachable;
                    // tripping it means the store was corrupted upstream.
                    error!(
                        withdrawal_id = %request.id(),
                        author_id = %request.author_id(),
                        unpaid_total = err.unpaid_total.minor_units(),
                        requested = err.requested.minor_units(),
                        "settlement shortfall, aborting payout"
                    );
                    Error::ledger_inconsistency(err.to_string()).with_details(json!({
                        "unpaidTotal": err.unpaid_total.minor_units(),
                        "requested": err.requested.minor_units(),
                    }))
                })?;

            let paid_at = self.clock.utc();
            request
                .mark_paid(paid_at, notes)
                .map_err(|err| Error::invalid_state(err.to_string()))?;
            self.ledger_repo
                .settle(&request, &settlement.accrual_ids, paid_at)
                .await
                .map_err(map_repository_error)?;
            (request, from, settlement.overshoot)
        };

        if !overshoot.is_zero() {
            // Whole-record consumption can settle more accrual than the
            // payout amount; surface the drift for reconciliation.
            warn!(
                withdrawal_id = %paid.id(),
                author_id = %paid.author_id(),
                overshoot = overshoot.minor_units(),
                "settlement consumed more accrual than the payout amount"
            );
        }
        info!(
            withdrawal_id = %paid.id(),
            author_id = %paid.author_id(),
            amount = paid.amount().minor_units(),
            "withdrawal paid"
        );
        self.emit(WithdrawalEvent::transitioned(&paid, from, self.clock.utc()))
            .await;
        Ok(paid)
    }
}

#[async_trait]
impl<R, N> WithdrawalQuery for WithdrawalLedgerService<R, N>
where
    R: LedgerRepository,
    N: LedgerNotifier,
{
    async fn available(&self, author_id: Uuid) -> Result<BalanceBreakdown, Error> {
        let snapshot = self
            .ledger_repo
            .load_author_ledger(author_id)
            .await
            .map_err(map_repository_error)?;
        Ok(balance(&snapshot.accruals, &snapshot.withdrawals))
    }

    async fn list_for_author(
        &self,
        author_id: Uuid,
        status: Option<WithdrawalStatus>,
    ) -> Result<AuthorWithdrawals, Error> {
        let snapshot = self
            .ledger_repo
            .load_author_ledger(author_id)
            .await
            .map_err(map_repository_error)?;
        // Balance always reflects the full ledger, not the filtered view.
        let breakdown = balance(&snapshot.accruals, &snapshot.withdrawals);
        let withdrawals = snapshot
            .withdrawals
            .into_iter()
            .filter(|request| status.is_none_or(|wanted| request.status() == wanted))
            .collect();
        Ok(AuthorWithdrawals {
            withdrawals,
            balance: breakdown,
        })
    }

    async fn list_all(&self, filter: WithdrawalFilter) -> Result<WithdrawalReview, Error> {
        let withdrawals = self
            .ledger_repo
            .list_withdrawals(filter)
            .await
            .map_err(map_repository_error)?;
        let counts = StatusCounts::tally(&withdrawals);
        Ok(WithdrawalReview {
            withdrawals,
            counts,
        })
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
