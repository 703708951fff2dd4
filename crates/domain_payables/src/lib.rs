//! Payables Domain - inter-company accounts payable ledger and settlement
//!
//! This crate implements the core of the payables engine:
//! - Vendor ledgers rebuilt from invoices, credit notes and payments
//! - Running balances with opening balance and per-entity totals
//! - Cross-entity liabilities for invoices shared between the two entities
//! - FIFO allocation of inter-company settlement payments
//! - Vendor, inter-company and system-wide balance summaries
//!
//! Every calculator is a pure function over a snapshot. [`PayablesEngine`]
//! reads the snapshot through [`ports::PayablesReadPort`] and persists results
//! through [`ports::PayablesWritePort`].

pub mod entity;
pub mod config;
pub mod invoice;
pub mod payment;
pub mod ledger;
pub mod running_balance;
pub mod liability;
pub mod settlement;
pub mod aggregate;
pub mod ports;
pub mod service;
pub mod error;

pub use entity::{EntityPair, LegalEntity, SplitTable};
pub use config::{EngineConfig, EngineSettings, DEFAULT_MAX_ALLOCATION_ATTEMPTS};
pub use invoice::{InvoiceStatus, VendorInvoice};
pub use payment::{PaymentMethod, VendorPayment};
pub use ledger::{
    DateRange, DocumentRef, EntryDirection, LedgerEntry, LedgerEntryBuilder, LedgerFilter,
    VendorDocuments,
};
pub use running_balance::{BalancedEntry, RunningBalance, VendorLedgerView};
pub use liability::{reconcile, CrossEntityLiability, LiabilityCalculator, LiabilityChange};
pub use settlement::{
    allocate, Allocation, Imputation, LiabilityUpdate, SettlementPayment, SettlementRequest,
};
pub use aggregate::{
    summarize, BalanceScope, BalanceSummary, InterCompanyPosition, SystemTotals, VendorBalance,
};
pub use ports::{PayablesReadPort, PayablesWritePort};
pub use service::{LiabilityPreview, PayablesEngine};
pub use error::PayablesError;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryPayablesStore;
