//! Shared Diesel error mapping for the ledger repository.

use tracing::debug;

use super::pool::PoolError;
use crate::domain::ports::LedgerRepositoryError;

/// Map pool errors into the repository's connection error.
pub(crate) fn map_pool_error(error: PoolError) -> LedgerRepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    LedgerRepositoryError::connection(message)
}

/// Map common Diesel error variants into query or connection errors.
///
/// `NotFound` and query-builder failures map to query errors; only a closed
/// connection maps to the connection variant.
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> LedgerRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => LedgerRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            LedgerRepositoryError::query("database query error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            LedgerRepositoryError::connection("database connection error")
        }
        _ => LedgerRepositoryError::query("database error"),
    }
}
