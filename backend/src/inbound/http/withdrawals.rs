//! Withdrawal and balance HTTP handlers.
//!
//! ```text
//! POST /api/authors/{author_id}/withdrawals
//! GET  /api/authors/{author_id}/withdrawals
//! GET  /api/authors/{author_id}/balance
//! GET  /api/withdrawals
//! PUT  /api/withdrawals/{withdrawal_id}/approve
//! PUT  /api/withdrawals/{withdrawal_id}/reject
//! PUT  /api/withdrawals/{withdrawal_id}/pay
//! ```

use actix_web::{get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{RequestWithdrawal, StatusCounts, WithdrawalFilter};
use crate::domain::{
    Amount, BalanceBreakdown, Error, PayoutDetails, WithdrawalMethod, WithdrawalRequest,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    missing_field_error, parse_status, parse_uuid, FieldName,
};
use crate::inbound::http::ApiResult;

/// Request payload for creating a withdrawal.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalBody {
    /// Requested amount in minor units.
    #[schema(example = 6000)]
    pub amount: i64,
    /// Payout channel: `MOBILE_MONEY`, `BANK` or `CASH`.
    pub method: String,
    pub mobile_money_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
    pub bank_account_name: Option<String>,
    pub notes: Option<String>,
}

/// Request payload for approving a withdrawal.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveWithdrawalBody {
    #[schema(format = "uuid")]
    pub validator_id: String,
    pub notes: Option<String>,
}

/// Request payload for rejecting a withdrawal.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectWithdrawalBody {
    #[schema(format = "uuid")]
    pub validator_id: String,
    pub reason: String,
    pub notes: Option<String>,
}

/// Request payload for confirming a payout.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayWithdrawalBody {
    pub notes: Option<String>,
}

/// Withdrawal representation returned by every endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub author_id: String,
    pub amount: i64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_money_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account_name: Option<String>,
    pub status: String,
    #[schema(format = "date-time")]
    pub requested_at: String,
    #[schema(format = "date-time")]
    pub validated_at: Option<String>,
    #[schema(format = "date-time")]
    pub paid_at: Option<String>,
    pub rejection_reason: Option<String>,
    #[schema(format = "uuid")]
    pub validator_id: Option<String>,
    pub notes: Option<String>,
}

impl From<&WithdrawalRequest> for WithdrawalBody {
    fn from(request: &WithdrawalRequest) -> Self {
        let (mobile_money_number, bank_name, bank_account, bank_account_name) =
            match request.details() {
                PayoutDetails::MobileMoney { msisdn } => {
                    (Some(msisdn.clone()), None, None, None)
                }
                PayoutDetails::Bank {
                    bank_name,
                    account_number,
                    account_holder,
                } => (
                    None,
                    Some(bank_name.clone()),
                    Some(account_number.clone()),
                    account_holder.clone(),
                ),
                PayoutDetails::Cash => (None, None, None, None),
            };
        Self {
            id: request.id().to_string(),
            author_id: request.author_id().to_string(),
            amount: request.amount().minor_units(),
            method: request.method().as_str().to_owned(),
            mobile_money_number,
            bank_name,
            bank_account,
            bank_account_name,
            status: request.status().as_str().to_owned(),
            requested_at: request.requested_at().to_rfc3339(),
            validated_at: request.validated_at().map(|at| at.to_rfc3339()),
            paid_at: request.paid_at().map(|at| at.to_rfc3339()),
            rejection_reason: request.rejection_reason().map(str::to_owned),
            validator_id: request.validator_id().map(|id| id.to_string()),
            notes: request.notes().map(str::to_owned),
        }
    }
}

/// An author's withdrawals with their balance breakdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorWithdrawalsBody {
    pub withdrawals: Vec<WithdrawalBody>,
    pub balance: BalanceBreakdown,
}

/// Per-status tallies in the administrative listing.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCountsBody {
    pub pending: usize,
    pub approved: usize,
    pub paid: usize,
    pub rejected: usize,
}

impl From<StatusCounts> for StatusCountsBody {
    fn from(counts: StatusCounts) -> Self {
        Self {
            pending: counts.pending,
            approved: counts.approved,
            paid: counts.paid,
            rejected: counts.rejected,
        }
    }
}

/// Administrative listing response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReviewBody {
    pub withdrawals: Vec<WithdrawalBody>,
    pub counts: StatusCountsBody,
}

/// Status filter on the author listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorListQuery {
    pub status: Option<String>,
}

/// Filters on the administrative listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListQuery {
    pub status: Option<String>,
    pub author_id: Option<String>,
}

fn parse_amount(amount: i64) -> Result<Amount, Error> {
    Amount::new(amount).map_err(|_| {
        Error::invalid_request("amount must not be negative").with_details(json!({
            "field": "amount",
            "value": amount,
        }))
    })
}

fn parse_payout_details(body: &CreateWithdrawalBody) -> Result<PayoutDetails, Error> {
    let method: WithdrawalMethod = body.method.parse().map_err(|_| {
        Error::invalid_request("method must be one of MOBILE_MONEY, BANK, CASH")
            .with_details(json!({
                "field": "method",
                "value": body.method,
            }))
    })?;
    match method {
        WithdrawalMethod::MobileMoney => {
            let msisdn = body
                .mobile_money_number
                .clone()
                .ok_or_else(|| missing_field_error(FieldName::new("mobileMoneyNumber")))?;
            Ok(PayoutDetails::MobileMoney { msisdn })
        }
        WithdrawalMethod::Bank => {
            let bank_name = body
                .bank_name
                .clone()
                .ok_or_else(|| missing_field_error(FieldName::new("bankName")))?;
            let account_number = body
                .bank_account
                .clone()
                .ok_or_else(|| missing_field_error(FieldName::new("bankAccount")))?;
            Ok(PayoutDetails::Bank {
                bank_name,
                account_number,
                account_holder: body.bank_account_name.clone(),
            })
        }
        WithdrawalMethod::Cash => Ok(PayoutDetails::Cash),
    }
}

fn parse_optional_status(
    value: Option<&str>,
) -> Result<Option<crate::domain::WithdrawalStatus>, Error> {
    value
        .map(|raw| parse_status(raw, FieldName::new("status")))
        .transpose()
}

/// Create a withdrawal request for an author.
#[utoipa::path(
    post,
    path = "/api/authors/{author_id}/withdrawals",
    request_body = CreateWithdrawalBody,
    responses(
        (status = 201, description = "Withdrawal request created", body = WithdrawalBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "A pending request already exists", body = Error),
        (status = 422, description = "Insufficient balance", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "createWithdrawal"
)]
#[post("/authors/{author_id}/withdrawals")]
pub async fn create_withdrawal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CreateWithdrawalBody>,
) -> ApiResult<HttpResponse> {
    let author_id = parse_uuid(&path.into_inner(), FieldName::new("authorId"))?;
    let body = payload.into_inner();
    let request = RequestWithdrawal {
        author_id,
        amount: parse_amount(body.amount)?,
        details: parse_payout_details(&body)?,
        notes: body.notes.clone(),
    };

    let created = state.commands.request_withdrawal(request).await?;
    Ok(HttpResponse::Created().json(WithdrawalBody::from(&created)))
}

/// List an author's withdrawals alongside their balance breakdown.
#[utoipa::path(
    get,
    path = "/api/authors/{author_id}/withdrawals",
    params(
        ("status" = Option<String>, Query, description = "Filter by lifecycle state")
    ),
    responses(
        (status = 200, description = "Author withdrawals", body = AuthorWithdrawalsBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "listAuthorWithdrawals"
)]
#[get("/authors/{author_id}/withdrawals")]
pub async fn list_author_withdrawals(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<AuthorListQuery>,
) -> ApiResult<web::Json<AuthorWithdrawalsBody>> {
    let author_id = parse_uuid(&path.into_inner(), FieldName::new("authorId"))?;
    let status = parse_optional_status(query.status.as_deref())?;

    let listing = state.queries.list_for_author(author_id, status).await?;
    Ok(web::Json(AuthorWithdrawalsBody {
        withdrawals: listing.withdrawals.iter().map(WithdrawalBody::from).collect(),
        balance: listing.balance,
    }))
}

/// Return an author's balance breakdown.
#[utoipa::path(
    get,
    path = "/api/authors/{author_id}/balance",
    responses(
        (status = 200, description = "Balance breakdown", body = BalanceBreakdown),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "getAuthorBalance"
)]
#[get("/authors/{author_id}/balance")]
pub async fn get_author_balance(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<BalanceBreakdown>> {
    let author_id = parse_uuid(&path.into_inner(), FieldName::new("authorId"))?;
    let breakdown = state.queries.available(author_id).await?;
    Ok(web::Json(breakdown))
}

/// Administrative listing across authors with per-status tallies.
#[utoipa::path(
    get,
    path = "/api/withdrawals",
    params(
        ("status" = Option<String>, Query, description = "Filter by lifecycle state"),
        ("authorId" = Option<String>, Query, description = "Filter by author")
    ),
    responses(
        (status = 200, description = "Withdrawals with tallies", body = WithdrawalReviewBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "listWithdrawals"
)]
#[get("/withdrawals")]
pub async fn list_withdrawals(
    state: web::Data<HttpState>,
    query: web::Query<ReviewListQuery>,
) -> ApiResult<web::Json<WithdrawalReviewBody>> {
    let filter = WithdrawalFilter {
        author_id: query
            .author_id
            .as_deref()
            .map(|raw| parse_uuid(raw, FieldName::new("authorId")))
            .transpose()?,
        status: parse_optional_status(query.status.as_deref())?,
    };

    let review = state.queries.list_all(filter).await?;
    Ok(web::Json(WithdrawalReviewBody {
        withdrawals: review.withdrawals.iter().map(WithdrawalBody::from).collect(),
        counts: StatusCountsBody::from(review.counts),
    }))
}

/// Approve a pending withdrawal.
#[utoipa::path(
    put,
    path = "/api/withdrawals/{withdrawal_id}/approve",
    request_body = ApproveWithdrawalBody,
    responses(
        (status = 200, description = "Withdrawal approved", body = WithdrawalBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Withdrawal not found", body = Error),
        (status = 409, description = "Not in a pending state", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "approveWithdrawal"
)]
#[put("/withdrawals/{withdrawal_id}/approve")]
pub async fn approve_withdrawal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ApproveWithdrawalBody>,
) -> ApiResult<web::Json<WithdrawalBody>> {
    let withdrawal_id = parse_uuid(&path.into_inner(), FieldName::new("withdrawalId"))?;
    let body = payload.into_inner();
    let validator_id = parse_uuid(&body.validator_id, FieldName::new("validatorId"))?;

    let approved = state
        .commands
        .approve(withdrawal_id, validator_id, body.notes)
        .await?;
    Ok(web::Json(WithdrawalBody::from(&approved)))
}

/// Reject a pending withdrawal with a reason.
#[utoipa::path(
    put,
    path = "/api/withdrawals/{withdrawal_id}/reject",
    request_body = RejectWithdrawalBody,
    responses(
        (status = 200, description = "Withdrawal rejected", body = WithdrawalBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Withdrawal not found", body = Error),
        (status = 409, description = "Not in a pending state", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "rejectWithdrawal"
)]
#[put("/withdrawals/{withdrawal_id}/reject")]
pub async fn reject_withdrawal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RejectWithdrawalBody>,
) -> ApiResult<web::Json<WithdrawalBody>> {
    let withdrawal_id = parse_uuid(&path.into_inner(), FieldName::new("withdrawalId"))?;
    let body = payload.into_inner();
    let validator_id = parse_uuid(&body.validator_id, FieldName::new("validatorId"))?;

    let rejected = state
        .commands
        .reject(withdrawal_id, validator_id, body.reason, body.notes)
        .await?;
    Ok(web::Json(WithdrawalBody::from(&rejected)))
}

/// Mark an approved withdrawal as paid, settling accruals.
#[utoipa::path(
    put,
    path = "/api/withdrawals/{withdrawal_id}/pay",
    request_body = PayWithdrawalBody,
    responses(
        (status = 200, description = "Withdrawal paid and settled", body = WithdrawalBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Withdrawal not found", body = Error),
        (status = 409, description = "Not in an approved state", body = Error),
        (status = 500, description = "Ledger inconsistency", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["withdrawals"],
    operation_id = "payWithdrawal"
)]
#[put("/withdrawals/{withdrawal_id}/pay")]
pub async fn pay_withdrawal(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PayWithdrawalBody>,
) -> ApiResult<web::Json<WithdrawalBody>> {
    let withdrawal_id = parse_uuid(&path.into_inner(), FieldName::new("withdrawalId"))?;
    let paid = state
        .commands
        .mark_paid(withdrawal_id, payload.into_inner().notes)
        .await?;
    Ok(web::Json(WithdrawalBody::from(&paid)))
}

#[cfg(test)]
#[path = "withdrawals_tests.rs"]
mod tests;
