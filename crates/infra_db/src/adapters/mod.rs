//! Domain Adapters
//!
//! Implementations of the payables ports backed by PostgreSQL. Each adapter
//! translates between domain values and row types and delegates SQL to the
//! repository layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPayablesAdapter;
//! use domain_payables::PayablesReadPort;
//!
//! let adapter = PostgresPayablesAdapter::new(pool);
//! let invoice = adapter.fetch_invoice(invoice_id).await?;
//! ```

pub mod payables;

pub use payables::PostgresPayablesAdapter;
