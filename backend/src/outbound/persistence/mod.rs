//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain's driven
//! ports backed by PostgreSQL via `diesel-async` and `bb8` pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: the repository only translates between Diesel rows
//!   and domain types. Rules live in the domain service.
//! - **Explicit executors**: every repository call receives an [`Executor`]
//!   naming the pool or an open transaction.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//!
//! # Example
//!
//! ```ignore
//! use phonebook::outbound::persistence::{DbPool, DieselTransactionSource, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/phonebook")).await?;
//! let source = DieselTransactionSource::new(pool.clone());
//! ```

pub mod bootstrap;
mod diesel_health_probe;
mod diesel_phonebook_repository;
mod models;
mod pool;
mod schema;
mod transaction;

pub use bootstrap::{BootstrapError, BootstrapReport, bootstrap};
pub use diesel_health_probe::DieselHealthProbe;
pub use diesel_phonebook_repository::DieselPhonebookRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
pub use transaction::{DieselTransactionSource, Executor, ExecutorConnection, TransactionHandle};
