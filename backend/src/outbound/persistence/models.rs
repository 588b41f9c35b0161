//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to translate between the
//! relational schema and the validated domain types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{royalties, withdrawals};
use crate::domain::{
    AccrualDraft, AccrualRecord, Amount, PayoutDetails, WithdrawalDraft, WithdrawalMethod,
    WithdrawalRequest, WithdrawalStatus,
};

/// Raised when a stored row cannot be decoded into a domain value.
///
/// Rows only become undecodable when the table was mutated outside this
/// application, so the message names the offending row for operators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row_id} failed domain validation: {message}")]
pub(crate) struct RowDecodeError {
    pub row_id: Uuid,
    pub message: String,
}

impl RowDecodeError {
    fn new(row_id: Uuid, message: impl std::fmt::Display) -> Self {
        Self {
            row_id,
            message: message.to_string(),
        }
    }
}

/// Row struct for reading from the royalties table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = royalties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoyaltyRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub work_id: Option<Uuid>,
    pub amount: i64,
    pub approved: bool,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RoyaltyRow {
    pub(crate) fn into_domain(self) -> Result<AccrualRecord, RowDecodeError> {
        let amount =
            Amount::new(self.amount).map_err(|err| RowDecodeError::new(self.id, err))?;
        AccrualRecord::new(AccrualDraft {
            id: self.id,
            author_id: self.author_id,
            work_id: self.work_id,
            amount,
            approved: self.approved,
            paid: self.paid,
            paid_at: self.paid_at,
            created_at: self.created_at,
        })
        .map_err(|err| RowDecodeError::new(self.id, err))
    }
}

/// Row struct for reading from the withdrawals table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = withdrawals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WithdrawalRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub amount: i64,
    pub method: String,
    pub mobile_money_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub bank_account_name: Option<String>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub validator_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl WithdrawalRow {
    fn decode_details(&self) -> Result<PayoutDetails, RowDecodeError> {
        let method: WithdrawalMethod = self
            .method
            .parse()
            .map_err(|err| RowDecodeError::new(self.id, err))?;
        match method {
            WithdrawalMethod::MobileMoney => {
                let msisdn = self.mobile_money_number.clone().ok_or_else(|| {
                    RowDecodeError::new(self.id, "mobile money row without a number")
                })?;
                Ok(PayoutDetails::MobileMoney { msisdn })
            }
            WithdrawalMethod::Bank => {
                let bank_name = self.bank_name.clone().ok_or_else(|| {
                    RowDecodeError::new(self.id, "bank row without a bank name")
                })?;
                let account_number = self.bank_account.clone().ok_or_else(|| {
                    RowDecodeError::new(self.id, "bank row without an account number")
                })?;
                Ok(PayoutDetails::Bank {
                    bank_name,
                    account_number,
                    account_holder: self.bank_account_name.clone(),
                })
            }
            WithdrawalMethod::Cash => Ok(PayoutDetails::Cash),
        }
    }

    pub(crate) fn into_domain(self) -> Result<WithdrawalRequest, RowDecodeError> {
        let details = self.decode_details()?;
        let status: WithdrawalStatus = self
            .status
            .parse()
            .map_err(|err| RowDecodeError::new(self.id, err))?;
        let amount =
            Amount::new(self.amount).map_err(|err| RowDecodeError::new(self.id, err))?;
        WithdrawalRequest::new(WithdrawalDraft {
            id: self.id,
            author_id: self.author_id,
            amount,
            details,
            status,
            requested_at: self.requested_at,
            validated_at: self.validated_at,
            paid_at: self.paid_at,
            rejection_reason: self.rejection_reason,
            validator_id: self.validator_id,
            notes: self.notes,
        })
        .map_err(|err| RowDecodeError::new(self.id, err))
    }
}

fn payout_columns(
    details: &PayoutDetails,
) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
    match details {
        PayoutDetails::MobileMoney { msisdn } => (Some(msisdn.as_str()), None, None, None),
        PayoutDetails::Bank {
            bank_name,
            account_number,
            account_holder,
        } => (
            None,
            Some(bank_name.as_str()),
            Some(account_number.as_str()),
            account_holder.as_deref(),
        ),
        PayoutDetails::Cash => (None, None, None, None),
    }
}

/// Insertable struct for creating new withdrawal records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = withdrawals)]
pub(crate) struct NewWithdrawalRow<'a> {
    pub id: Uuid,
    pub author_id: Uuid,
    pub amount: i64,
    pub method: &'a str,
    pub mobile_money_number: Option<&'a str>,
    pub bank_name: Option<&'a str>,
    pub bank_account: Option<&'a str>,
    pub bank_account_name: Option<&'a str>,
    pub status: &'a str,
    pub requested_at: DateTime<Utc>,
    pub notes: Option<&'a str>,
}

impl<'a> NewWithdrawalRow<'a> {
    pub(crate) fn from_domain(request: &'a WithdrawalRequest) -> Self {
        let (mobile_money_number, bank_name, bank_account, bank_account_name) =
            payout_columns(request.details());
        Self {
            id: request.id(),
            author_id: request.author_id(),
            amount: request.amount().minor_units(),
            method: request.method().as_str(),
            mobile_money_number,
            bank_name,
            bank_account,
            bank_account_name,
            status: request.status().as_str(),
            requested_at: request.requested_at(),
            notes: request.notes(),
        }
    }
}

/// Changeset struct for lifecycle updates to existing withdrawal records.
///
/// Payout coordinates and the requested amount are immutable after insert, so
/// only decision fields appear here.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = withdrawals)]
pub(crate) struct WithdrawalUpdate<'a> {
    pub status: &'a str,
    pub validated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<&'a str>,
    pub validator_id: Option<Uuid>,
    pub notes: Option<&'a str>,
}

impl<'a> WithdrawalUpdate<'a> {
    pub(crate) fn from_domain(request: &'a WithdrawalRequest) -> Self {
        Self {
            status: request.status().as_str(),
            validated_at: request.validated_at(),
            paid_at: request.paid_at(),
            rejection_reason: request.rejection_reason(),
            validator_id: request.validator_id(),
            notes: request.notes(),
        }
    }
}
