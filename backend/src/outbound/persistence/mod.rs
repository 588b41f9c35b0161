//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides the concrete implementation of the ledger repository
//! port backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Transactional settlement**: The accrual flips and the withdrawal state
//!   write commit together inside one database transaction.
//! - **Strongly typed errors**: All database errors are mapped to the domain
//!   repository error type.

mod diesel_ledger_repository;
mod error_mapping;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod models;
mod pool;
mod schema;

pub use diesel_ledger_repository::DieselLedgerRepository;
#[cfg(any(test, feature = "test-support"))]
pub use memory::InMemoryLedgerRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
