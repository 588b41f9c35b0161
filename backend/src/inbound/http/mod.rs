//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod state;
pub mod validation;
pub mod withdrawals;

pub use error::ApiResult;
