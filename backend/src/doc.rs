//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API: the withdrawal and balance endpoints plus
//! the health probes. The generated specification backs Swagger UI in debug
//! builds.

use utoipa::OpenApi;

use crate::domain::{BalanceBreakdown, Error, ErrorCode};
use crate::inbound::http::withdrawals::{
    ApproveWithdrawalBody, AuthorWithdrawalsBody, CreateWithdrawalBody, PayWithdrawalBody,
    RejectWithdrawalBody, StatusCountsBody, WithdrawalBody, WithdrawalReviewBody,
};

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Royalty ledger API",
        description = "Author withdrawal requests, validator decisions, and \
                       balance reads over the royalty ledger."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::withdrawals::create_withdrawal,
        crate::inbound::http::withdrawals::list_author_withdrawals,
        crate::inbound::http::withdrawals::get_author_balance,
        crate::inbound::http::withdrawals::list_withdrawals,
        crate::inbound::http::withdrawals::approve_withdrawal,
        crate::inbound::http::withdrawals::reject_withdrawal,
        crate::inbound::http::withdrawals::pay_withdrawal,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        CreateWithdrawalBody,
        ApproveWithdrawalBody,
        RejectWithdrawalBody,
        PayWithdrawalBody,
        WithdrawalBody,
        AuthorWithdrawalsBody,
        WithdrawalReviewBody,
        StatusCountsBody,
        BalanceBreakdown,
        Error,
        ErrorCode,
    )),
    tags(
        (name = "withdrawals", description = "Withdrawal requests and validator decisions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
