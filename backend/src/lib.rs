//! Royalty ledger backend: accrual tracking, balance computation, and the
//! withdrawal settlement engine for a publishing-house platform.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the entities,
//! calculators, service, and port traits; [`outbound`] implements the ports
//! over PostgreSQL and a webhook sink; [`inbound`] exposes the REST surface.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
