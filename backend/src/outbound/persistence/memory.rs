//! In-memory `LedgerRepository` for tests and local experimentation.
//!
//! Holds both stores behind one async lock, so each port call is atomic the
//! same way the Diesel adapter's transactions are. A `record_accrual` hook
//! stands in for the external sales pipeline that produces accruals in
//! production.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, LedgerSnapshot, WithdrawalFilter,
};
use crate::domain::{
    AccrualDraft, AccrualRecord, AccrualValidationError, Amount, WithdrawalRequest,
};

#[derive(Debug, Default)]
struct Stores {
    accruals: Vec<AccrualRecord>,
    withdrawals: Vec<WithdrawalRequest>,
    /// Monotonic counter spacing accrual timestamps so FIFO order is
    /// deterministic even when records are seeded in the same instant.
    accrual_seq: i64,
}

/// Ledger repository backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    stores: RwLock<Stores>,
}

impl InMemoryLedgerRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one accrual record, mimicking the external accrual producer.
    /// Returns the new record's id.
    pub async fn record_accrual(
        &self,
        author_id: Uuid,
        work_id: Option<Uuid>,
        amount: Amount,
    ) -> Result<Uuid, AccrualValidationError> {
        let mut stores = self.stores.write().await;
        stores.accrual_seq += 1;
        let record = AccrualRecord::new(AccrualDraft {
            id: Uuid::new_v4(),
            author_id,
            work_id,
            amount,
            approved: true,
            paid: false,
            paid_at: None,
            created_at: accrual_timestamp(stores.accrual_seq),
        })?;
        let id = record.id();
        stores.accruals.push(record);
        Ok(id)
    }

    /// Snapshot every accrual for an author, any settlement state.
    pub async fn accruals_for(&self, author_id: Uuid) -> Vec<AccrualRecord> {
        let stores = self.stores.read().await;
        stores
            .accruals
            .iter()
            .filter(|record| record.author_id() == author_id)
            .cloned()
            .collect()
    }
}

fn accrual_timestamp(seq: i64) -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + Duration::seconds(seq)
}

fn sorted_newest_first(mut withdrawals: Vec<WithdrawalRequest>) -> Vec<WithdrawalRequest> {
    withdrawals.sort_by(|a, b| b.requested_at().cmp(&a.requested_at()));
    withdrawals
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn load_author_ledger(
        &self,
        author_id: Uuid,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        let stores = self.stores.read().await;
        let accruals = stores
            .accruals
            .iter()
            .filter(|record| record.author_id() == author_id)
            .cloned()
            .collect();
        let withdrawals = stores
            .withdrawals
            .iter()
            .filter(|request| request.author_id() == author_id)
            .cloned()
            .collect();
        Ok(LedgerSnapshot {
            accruals,
            withdrawals: sorted_newest_first(withdrawals),
        })
    }

    async fn insert_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError> {
        let mut stores = self.stores.write().await;
        if stores.withdrawals.iter().any(|w| w.id() == request.id()) {
            return Err(LedgerRepositoryError::query(format!(
                "withdrawal {} already exists",
                request.id()
            )));
        }
        stores.withdrawals.push(request.clone());
        Ok(())
    }

    async fn find_withdrawal(
        &self,
        withdrawal_id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, LedgerRepositoryError> {
        let stores = self.stores.read().await;
        Ok(stores
            .withdrawals
            .iter()
            .find(|request| request.id() == withdrawal_id)
            .cloned())
    }

    async fn update_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError> {
        let mut stores = self.stores.write().await;
        let slot = stores
            .withdrawals
            .iter_mut()
            .find(|existing| existing.id() == request.id())
            .ok_or_else(|| {
                LedgerRepositoryError::query(format!("withdrawal {} not found", request.id()))
            })?;
        *slot = request.clone();
        Ok(())
    }

    async fn unpaid_accruals(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<AccrualRecord>, LedgerRepositoryError> {
        let stores = self.stores.read().await;
        let mut unpaid: Vec<AccrualRecord> = stores
            .accruals
            .iter()
            .filter(|record| record.author_id() == author_id && !record.is_paid())
            .cloned()
            .collect();
        unpaid.sort_by_key(|record| (record.created_at(), record.id()));
        Ok(unpaid)
    }

    async fn settle(
        &self,
        request: &WithdrawalRequest,
        accrual_ids: &[Uuid],
        paid_at: DateTime<Utc>,
    ) -> Result<(), LedgerRepositoryError> {
        let mut stores = self.stores.write().await;

        // Validate everything before mutating so a failure leaves the
        // stores untouched, matching the Diesel adapter's transaction.
        if !stores
            .withdrawals
            .iter()
            .any(|existing| existing.id() == request.id())
        {
            return Err(LedgerRepositoryError::query(format!(
                "withdrawal {} not found",
                request.id()
            )));
        }
        for id in accrual_ids {
            let known_unpaid = stores
                .accruals
                .iter()
                .any(|record| record.id() == *id && !record.is_paid());
            if !known_unpaid {
                return Err(LedgerRepositoryError::query(format!(
                    "accrual {id} missing or already paid"
                )));
            }
        }

        for record in &mut stores.accruals {
            if accrual_ids.contains(&record.id()) {
                let draft = AccrualDraft {
                    id: record.id(),
                    author_id: record.author_id(),
                    work_id: record.work_id(),
                    amount: record.amount(),
                    approved: record.is_approved(),
                    paid: true,
                    paid_at: Some(paid_at),
                    created_at: record.created_at(),
                };
                *record = AccrualRecord::new(draft).map_err(|err| {
                    LedgerRepositoryError::query(format!("settled accrual invalid: {err}"))
                })?;
            }
        }
        if let Some(slot) = stores
            .withdrawals
            .iter_mut()
            .find(|existing| existing.id() == request.id())
        {
            *slot = request.clone();
        }
        Ok(())
    }

    async fn list_withdrawals(
        &self,
        filter: WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, LedgerRepositoryError> {
        let stores = self.stores.read().await;
        let withdrawals = stores
            .withdrawals
            .iter()
            .filter(|request| {
                filter
                    .author_id
                    .is_none_or(|author| request.author_id() == author)
                    && filter.status.is_none_or(|status| request.status() == status)
            })
            .cloned()
            .collect();
        Ok(sorted_newest_first(withdrawals))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the in-memory adapter's atomic settle.

    use rstest::rstest;

    use super::*;
    use crate::domain::PayoutDetails;

    fn amount(value: i64) -> Amount {
        Amount::new(value).expect("valid amount")
    }

    #[rstest]
    #[tokio::test]
    async fn settle_rejects_unknown_accruals_without_mutating() {
        let repo = InMemoryLedgerRepository::new();
        let author = Uuid::new_v4();
        let known = repo
            .record_accrual(author, None, amount(1_000))
            .await
            .expect("seeded");
        let request = WithdrawalRequest::pending(
            author,
            amount(1_000),
            PayoutDetails::Cash,
            Utc::now(),
            None,
        )
        .expect("valid request");
        repo.insert_withdrawal(&request).await.expect("inserted");

        let err = repo
            .settle(&request, &[known, Uuid::new_v4()], Utc::now())
            .await
            .expect_err("unknown accrual rejected");
        assert!(matches!(err, LedgerRepositoryError::Query { .. }));

        let accruals = repo.accruals_for(author).await;
        assert!(
            accruals.iter().all(|record| !record.is_paid()),
            "failed settle must not flip any record"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn accruals_keep_seed_order_for_fifo() {
        let repo = InMemoryLedgerRepository::new();
        let author = Uuid::new_v4();
        let first = repo
            .record_accrual(author, None, amount(1_000))
            .await
            .expect("seeded");
        let second = repo
            .record_accrual(author, None, amount(2_000))
            .await
            .expect("seeded");

        let unpaid = repo.unpaid_accruals(author).await.expect("listed");
        let ids: Vec<Uuid> = unpaid.iter().map(AccrualRecord::id).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
