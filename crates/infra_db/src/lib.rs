//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the payables engine using SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL and the row types
//! - [`adapters`] implement the domain ports on top of the repositories
//! - [`pool`] creates connection pools and applies migrations
//!
//! Balances are never persisted. The database stores source documents,
//! cross-entity liabilities with their remaining amounts, and settlements
//! with their imputations.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPayablesAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/payables")).await?;
//! run_migrations(&pool).await?;
//! let adapter = PostgresPayablesAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::PayablesRepository;
pub use adapters::PostgresPayablesAdapter;
