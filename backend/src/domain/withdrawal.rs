//! Withdrawal requests and their lifecycle state machine.
//!
//! A withdrawal converts earned balance into an external payout. The status
//! lattice is closed: `PENDING → APPROVED → PAID` on the happy path,
//! `PENDING → REJECTED` as the only other edge. REJECTED and PAID are
//! terminal. Transitions are enforced here so adapters can never persist an
//! undefined edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Amount;

/// Lifecycle states of a withdrawal request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    /// Awaiting a validator decision. At most one per author at a time.
    Pending,
    /// Cleared for payout; an external process executes the payment.
    Approved,
    /// Declined by a validator. Terminal; releases the reservation.
    Rejected,
    /// Payout confirmed and settled against accrual records. Terminal.
    Paid,
}

impl WithdrawalStatus {
    /// Stable wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Paid => "PAID",
        }
    }

    /// Whether the request still reserves balance. Every non-rejected state
    /// counts against the author's available balance.
    #[must_use]
    pub const fn reserves_balance(self) -> bool {
        !matches!(self, Self::Rejected)
    }

    /// Whether the defined transition table permits `self → to`.
    #[must_use]
    pub const fn permits(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Paid)
        )
    }
}

impl std::str::FromStr for WithdrawalStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "PAID" => Ok(Self::Paid),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payout channels supported by the publishing house.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalMethod {
    /// Mobile-money transfer to a subscriber number.
    MobileMoney,
    /// Bank transfer to a named account.
    Bank,
    /// Cash handover at the publishing house.
    Cash,
}

impl WithdrawalMethod {
    /// Stable wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MobileMoney => "MOBILE_MONEY",
            Self::Bank => "BANK",
            Self::Cash => "CASH",
        }
    }
}

impl std::str::FromStr for WithdrawalMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MOBILE_MONEY" => Ok(Self::MobileMoney),
            "BANK" => Ok(Self::Bank),
            "CASH" => Ok(Self::Cash),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

impl std::fmt::Display for WithdrawalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing an unknown status or method string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

/// Method-specific payout coordinates.
///
/// The variant fixes which fields are required, so a bank withdrawal without
/// an account number is unrepresentable once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutDetails {
    /// Mobile-money payout.
    MobileMoney {
        /// Subscriber number the transfer is sent to.
        msisdn: String,
    },
    /// Bank transfer payout.
    Bank {
        /// Receiving bank name.
        bank_name: String,
        /// Receiving account number.
        account_number: String,
        /// Account holder, when it differs from the author's legal name.
        account_holder: Option<String>,
    },
    /// Cash payout; no coordinates needed.
    Cash,
}

/// Validation failures for payout details.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayoutDetailsValidationError {
    /// A required field was empty or missing.
    #[error("required payout field is empty: {field}")]
    EmptyField {
        /// Name of the offending field on the wire.
        field: &'static str,
    },
}

impl PayoutDetails {
    /// The payout channel this detail set belongs to.
    #[must_use]
    pub const fn method(&self) -> WithdrawalMethod {
        match self {
            Self::MobileMoney { .. } => WithdrawalMethod::MobileMoney,
            Self::Bank { .. } => WithdrawalMethod::Bank,
            Self::Cash => WithdrawalMethod::Cash,
        }
    }

    /// Check that every required field carries a non-blank value.
    pub fn validate(&self) -> Result<(), PayoutDetailsValidationError> {
        let empty = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(PayoutDetailsValidationError::EmptyField { field })
            } else {
                Ok(())
            }
        };

        match self {
            Self::MobileMoney { msisdn } => empty("mobileMoneyNumber", msisdn),
            Self::Bank {
                bank_name,
                account_number,
                account_holder: _,
            } => {
                empty("bankName", bank_name)?;
                empty("bankAccount", account_number)
            }
            Self::Cash => Ok(()),
        }
    }
}

/// Unvalidated withdrawal fields, from a new request or decoded from storage.
#[derive(Debug, Clone)]
pub struct WithdrawalDraft {
    pub id: Uuid,
    pub author_id: Uuid,
    pub amount: Amount,
    pub details: PayoutDetails,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub validator_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Validation failures raised when constructing a [`WithdrawalRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WithdrawalValidationError {
    /// Withdrawal amounts must be strictly positive.
    #[error("withdrawal amount must be greater than zero")]
    ZeroAmount,
    /// Payout coordinates failed field validation.
    #[error(transparent)]
    Payout(#[from] PayoutDetailsValidationError),
    /// A rejected request must record why.
    #[error("rejected withdrawal is missing its rejection reason")]
    MissingRejectionReason,
    /// Only rejected requests may carry a rejection reason.
    #[error("non-rejected withdrawal carries a rejection reason")]
    UnexpectedRejectionReason,
    /// A paid request must carry its payout timestamp.
    #[error("paid withdrawal is missing paid_at")]
    PaidWithoutTimestamp,
}

/// Raised when a lifecycle operation targets the wrong source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("withdrawal transition {from} → {to} is not defined")]
pub struct InvalidTransition {
    /// State the request is currently in.
    pub from: WithdrawalStatus,
    /// State the operation tried to reach.
    pub to: WithdrawalStatus,
}

/// One author-initiated request to convert earned balance into a payout.
///
/// ## Invariants
/// - `amount` is strictly positive.
/// - `rejection_reason` is present iff the status is REJECTED.
/// - `paid_at` is present iff the status is PAID.
/// - Status only moves along the edges [`WithdrawalStatus::permits`] allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    id: Uuid,
    author_id: Uuid,
    amount: Amount,
    details: PayoutDetails,
    status: WithdrawalStatus,
    requested_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    validator_id: Option<Uuid>,
    notes: Option<String>,
}

impl WithdrawalRequest {
    /// Validate a draft into a withdrawal request.
    pub fn new(draft: WithdrawalDraft) -> Result<Self, WithdrawalValidationError> {
        if draft.amount.is_zero() {
            return Err(WithdrawalValidationError::ZeroAmount);
        }
        draft.details.validate()?;
        match (draft.status, draft.rejection_reason.as_deref()) {
            (WithdrawalStatus::Rejected, None) => {
                return Err(WithdrawalValidationError::MissingRejectionReason);
            }
            (WithdrawalStatus::Rejected, Some(reason)) if reason.trim().is_empty() => {
                return Err(WithdrawalValidationError::MissingRejectionReason);
            }
            (status, Some(_)) if status != WithdrawalStatus::Rejected => {
                return Err(WithdrawalValidationError::UnexpectedRejectionReason);
            }
            _ => {}
        }
        if draft.status == WithdrawalStatus::Paid && draft.paid_at.is_none() {
            return Err(WithdrawalValidationError::PaidWithoutTimestamp);
        }

        Ok(Self {
            id: draft.id,
            author_id: draft.author_id,
            amount: draft.amount,
            details: draft.details,
            status: draft.status,
            requested_at: draft.requested_at,
            validated_at: draft.validated_at,
            paid_at: draft.paid_at,
            rejection_reason: draft.rejection_reason,
            validator_id: draft.validator_id,
            notes: draft.notes,
        })
    }

    /// Build a fresh PENDING request.
    pub fn pending(
        author_id: Uuid,
        amount: Amount,
        details: PayoutDetails,
        requested_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Self, WithdrawalValidationError> {
        Self::new(WithdrawalDraft {
            id: Uuid::new_v4(),
            author_id,
            amount,
            details,
            status: WithdrawalStatus::Pending,
            requested_at,
            validated_at: None,
            paid_at: None,
            rejection_reason: None,
            validator_id: None,
            notes,
        })
    }

    fn transition(&mut self, to: WithdrawalStatus) -> Result<(), InvalidTransition> {
        if !self.status.permits(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Approve a pending request.
    pub fn approve(
        &mut self,
        validator_id: Uuid,
        validated_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.transition(WithdrawalStatus::Approved)?;
        self.validator_id = Some(validator_id);
        self.validated_at = Some(validated_at);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Reject a pending request, recording the reason.
    ///
    /// The reason must be validated as non-empty by the caller; this method
    /// only enforces the state machine.
    pub fn reject(
        &mut self,
        validator_id: Uuid,
        reason: String,
        validated_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.transition(WithdrawalStatus::Rejected)?;
        self.validator_id = Some(validator_id);
        self.validated_at = Some(validated_at);
        self.rejection_reason = Some(reason);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Mark an approved request as paid out.
    pub fn mark_paid(
        &mut self,
        paid_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<(), InvalidTransition> {
        self.transition(WithdrawalStatus::Paid)?;
        self.paid_at = Some(paid_at);
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }

    /// Request identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Author the payout belongs to.
    #[must_use]
    pub const fn author_id(&self) -> Uuid {
        self.author_id
    }

    /// Requested payout amount.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        self.amount
    }

    /// Payout coordinates.
    #[must_use]
    pub const fn details(&self) -> &PayoutDetails {
        &self.details
    }

    /// Payout channel.
    #[must_use]
    pub const fn method(&self) -> WithdrawalMethod {
        self.details.method()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> WithdrawalStatus {
        self.status
    }

    /// When the author filed the request.
    #[must_use]
    pub const fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// When a validator decided the request, if they have.
    #[must_use]
    pub const fn validated_at(&self) -> Option<DateTime<Utc>> {
        self.validated_at
    }

    /// When the payout was confirmed, once paid.
    #[must_use]
    pub const fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    /// Why the request was rejected, when it was.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Validator who decided the request, if any.
    #[must_use]
    pub const fn validator_id(&self) -> Option<Uuid> {
        self.validator_id
    }

    /// Free-form validator notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the withdrawal state machine.

    use rstest::rstest;

    use super::*;

    fn pending_request() -> WithdrawalRequest {
        WithdrawalRequest::pending(
            Uuid::new_v4(),
            Amount::new(6_000).expect("valid amount"),
            PayoutDetails::Cash,
            Utc::now(),
            None,
        )
        .expect("valid request")
    }

    #[rstest]
    #[case(WithdrawalStatus::Pending, WithdrawalStatus::Approved, true)]
    #[case(WithdrawalStatus::Pending, WithdrawalStatus::Rejected, true)]
    #[case(WithdrawalStatus::Approved, WithdrawalStatus::Paid, true)]
    #[case(WithdrawalStatus::Pending, WithdrawalStatus::Paid, false)]
    #[case(WithdrawalStatus::Approved, WithdrawalStatus::Rejected, false)]
    #[case(WithdrawalStatus::Rejected, WithdrawalStatus::Approved, false)]
    #[case(WithdrawalStatus::Paid, WithdrawalStatus::Approved, false)]
    #[case(WithdrawalStatus::Paid, WithdrawalStatus::Paid, false)]
    fn transition_table_is_closed(
        #[case] from: WithdrawalStatus,
        #[case] to: WithdrawalStatus,
        #[case] permitted: bool,
    ) {
        assert_eq!(from.permits(to), permitted);
    }

    #[rstest]
    fn happy_path_reaches_paid() {
        let mut request = pending_request();
        let validator = Uuid::new_v4();
        let now = Utc::now();

        request
            .approve(validator, now, Some("batch 12".into()))
            .expect("pending approves");
        assert_eq!(request.status(), WithdrawalStatus::Approved);
        assert_eq!(request.validator_id(), Some(validator));

        request.mark_paid(now, None).expect("approved pays");
        assert_eq!(request.status(), WithdrawalStatus::Paid);
        assert_eq!(request.paid_at(), Some(now));
        assert_eq!(request.notes(), Some("batch 12"));
    }

    #[rstest]
    fn paying_a_pending_request_is_rejected() {
        let mut request = pending_request();
        let err = request
            .mark_paid(Utc::now(), None)
            .expect_err("pending cannot pay");
        assert_eq!(err.from, WithdrawalStatus::Pending);
        assert_eq!(err.to, WithdrawalStatus::Paid);
    }

    #[rstest]
    fn second_mark_paid_is_rejected() {
        let mut request = pending_request();
        let now = Utc::now();
        request
            .approve(Uuid::new_v4(), now, None)
            .expect("pending approves");
        request.mark_paid(now, None).expect("approved pays");

        let err = request
            .mark_paid(now, None)
            .expect_err("paid is terminal");
        assert_eq!(err.from, WithdrawalStatus::Paid);
    }

    #[rstest]
    fn rejection_records_reason() {
        let mut request = pending_request();
        request
            .reject(Uuid::new_v4(), "duplicate".into(), Utc::now(), None)
            .expect("pending rejects");
        assert_eq!(request.status(), WithdrawalStatus::Rejected);
        assert_eq!(request.rejection_reason(), Some("duplicate"));
        assert!(!request.status().reserves_balance());
    }

    #[rstest]
    fn draft_with_rejected_status_requires_reason() {
        let mut draft = WithdrawalDraft {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            amount: Amount::new(6_000).expect("valid amount"),
            details: PayoutDetails::Cash,
            status: WithdrawalStatus::Rejected,
            requested_at: Utc::now(),
            validated_at: Some(Utc::now()),
            paid_at: None,
            rejection_reason: None,
            validator_id: Some(Uuid::new_v4()),
            notes: None,
        };
        let err = WithdrawalRequest::new(draft.clone()).expect_err("reason required");
        assert_eq!(err, WithdrawalValidationError::MissingRejectionReason);

        draft.rejection_reason = Some("   ".into());
        let blank = WithdrawalRequest::new(draft).expect_err("blank reason rejected");
        assert_eq!(blank, WithdrawalValidationError::MissingRejectionReason);
    }

    #[rstest]
    fn bank_details_require_bank_fields() {
        let details = PayoutDetails::Bank {
            bank_name: "BGFI".into(),
            account_number: String::new(),
            account_holder: None,
        };
        let err = details.validate().expect_err("empty account rejected");
        assert_eq!(
            err,
            PayoutDetailsValidationError::EmptyField {
                field: "bankAccount"
            }
        );
    }

    #[rstest]
    fn mobile_money_details_require_number() {
        let details = PayoutDetails::MobileMoney {
            msisdn: " ".into(),
        };
        let err = details.validate().expect_err("blank number rejected");
        assert_eq!(
            err,
            PayoutDetailsValidationError::EmptyField {
                field: "mobileMoneyNumber"
            }
        );
    }

    #[rstest]
    fn zero_amount_request_is_rejected() {
        let err = WithdrawalRequest::pending(
            Uuid::new_v4(),
            Amount::ZERO,
            PayoutDetails::Cash,
            Utc::now(),
            None,
        )
        .expect_err("zero amount rejected");
        assert_eq!(err, WithdrawalValidationError::ZeroAmount);
    }
}
