//! PostgreSQL-backed `LedgerRepository` implementation using Diesel ORM.
//!
//! This adapter persists withdrawal requests and settles accrual records
//! through validated domain constructors. Settlement runs as a single
//! transaction so the accrual flips and the withdrawal's PAID state commit
//! together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, LedgerSnapshot, WithdrawalFilter,
};
use crate::domain::{AccrualRecord, WithdrawalRequest};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewWithdrawalRow, RowDecodeError, RoyaltyRow, WithdrawalRow, WithdrawalUpdate};
use super::pool::DbPool;
use super::schema::{royalties, withdrawals};

/// Diesel-backed implementation of the ledger repository port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_decode_error(error: RowDecodeError) -> LedgerRepositoryError {
    LedgerRepositoryError::query(error.to_string())
}

fn decode_accruals(rows: Vec<RoyaltyRow>) -> Result<Vec<AccrualRecord>, LedgerRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(map_decode_error))
        .collect()
}

fn decode_withdrawals(
    rows: Vec<WithdrawalRow>,
) -> Result<Vec<WithdrawalRequest>, LedgerRepositoryError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(map_decode_error))
        .collect()
}

/// Failure inside the settlement transaction.
///
/// Wraps Diesel's error so a settlement precondition failure can abort and
/// roll back the transaction with a precise message.
#[derive(Debug)]
enum SettleTxError {
    Diesel(diesel::result::Error),
    Precondition(String),
}

impl From<diesel::result::Error> for SettleTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_settle_error(error: SettleTxError) -> LedgerRepositoryError {
    match error {
        SettleTxError::Diesel(err) => map_diesel_error(err),
        SettleTxError::Precondition(message) => LedgerRepositoryError::query(message),
    }
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn load_author_ledger(
        &self,
        author_id: Uuid,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        // One transaction so both SELECTs observe the same MVCC snapshot and
        // balance arithmetic never mixes ledger versions.
        let (accrual_rows, withdrawal_rows) = conn
            .transaction(|conn| {
                async move {
                    let accrual_rows: Vec<RoyaltyRow> = royalties::table
                        .filter(royalties::author_id.eq(author_id))
                        .select(RoyaltyRow::as_select())
                        .order_by((royalties::created_at, royalties::id))
                        .load(conn)
                        .await?;
                    let withdrawal_rows: Vec<WithdrawalRow> = withdrawals::table
                        .filter(withdrawals::author_id.eq(author_id))
                        .select(WithdrawalRow::as_select())
                        .order_by(withdrawals::requested_at.desc())
                        .load(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((accrual_rows, withdrawal_rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(LedgerSnapshot {
            accruals: decode_accruals(accrual_rows)?,
            withdrawals: decode_withdrawals(withdrawal_rows)?,
        })
    }

    async fn insert_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewWithdrawalRow::from_domain(request);
        diesel::insert_into(withdrawals::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_withdrawal(
        &self,
        withdrawal_id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<WithdrawalRow> = withdrawals::table
            .find(withdrawal_id)
            .select(WithdrawalRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_domain().map_err(map_decode_error))
            .transpose()
    }

    async fn update_withdrawal(
        &self,
        request: &WithdrawalRequest,
    ) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = WithdrawalUpdate::from_domain(request);
        let updated = diesel::update(withdrawals::table.find(request.id()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated != 1 {
            return Err(LedgerRepositoryError::query(format!(
                "withdrawal {} not found",
                request.id()
            )));
        }
        Ok(())
    }

    async fn unpaid_accruals(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<AccrualRecord>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RoyaltyRow> = royalties::table
            .filter(royalties::author_id.eq(author_id))
            .filter(royalties::paid.eq(false))
            .select(RoyaltyRow::as_select())
            .order_by((royalties::created_at, royalties::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_accruals(rows)
    }

    async fn settle(
        &self,
        request: &WithdrawalRequest,
        accrual_ids: &[Uuid],
        paid_at: DateTime<Utc>,
    ) -> Result<(), LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = WithdrawalUpdate::from_domain(request);
        let withdrawal_id = request.id();
        let ids = accrual_ids.to_vec();

        conn.transaction(|conn| {
            async move {
                let flipped = diesel::update(
                    royalties::table
                        .filter(royalties::id.eq_any(&ids))
                        .filter(royalties::paid.eq(false)),
                )
                .set((
                    royalties::paid.eq(true),
                    royalties::paid_at.eq(Some(paid_at)),
                ))
                .execute(conn)
                .await?;
                if flipped != ids.len() {
                    // Returning an error rolls back every flip above.
                    return Err(SettleTxError::Precondition(format!(
                        "settlement expected {} unpaid accruals, matched {flipped}",
                        ids.len()
                    )));
                }

                let updated = diesel::update(withdrawals::table.find(withdrawal_id))
                    .set(&update)
                    .execute(conn)
                    .await?;
                if updated != 1 {
                    return Err(SettleTxError::Precondition(format!(
                        "withdrawal {withdrawal_id} not found during settlement"
                    )));
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_settle_error)
    }

    async fn list_withdrawals(
        &self,
        filter: WithdrawalFilter,
    ) -> Result<Vec<WithdrawalRequest>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = withdrawals::table
            .select(WithdrawalRow::as_select())
            .order_by(withdrawals::requested_at.desc())
            .into_boxed();
        if let Some(author_id) = filter.author_id {
            query = query.filter(withdrawals::author_id.eq(author_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(withdrawals::status.eq(status.as_str()));
        }
        let rows: Vec<WithdrawalRow> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        decode_withdrawals(rows)
    }
}
