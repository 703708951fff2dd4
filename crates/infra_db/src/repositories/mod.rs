//! Repository implementations
//!
//! Repositories own the SQL. They speak in row types and plain `Decimal`
//! amounts; conversion to domain values happens in the adapters.
//!
//! - Runtime-checked queries (`sqlx::query`, `query_as`)
//! - Settlement commits in a single SERIALIZABLE transaction
//! - Optimistic concurrency via compare-and-swap on remaining amounts

pub mod payables;

pub use payables::PayablesRepository;
