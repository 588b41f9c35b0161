//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{WithdrawalCommand, WithdrawalQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Withdrawal mutations (request, approve, reject, pay).
    pub commands: Arc<dyn WithdrawalCommand>,
    /// Balance and listing reads.
    pub queries: Arc<dyn WithdrawalQuery>,
}

impl HttpState {
    /// Bundle command and query port implementations for the handlers.
    pub fn new(commands: Arc<dyn WithdrawalCommand>, queries: Arc<dyn WithdrawalQuery>) -> Self {
        Self { commands, queries }
    }
}
