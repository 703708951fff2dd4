//! Core Kernel - Foundational types for the inter-company payables engine
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money as integer cents with a decimal boundary
//! - Strongly typed identifiers
//! - Port infrastructure for the hexagonal architecture

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MoneyError, Rate};
pub use identifiers::{VendorId, InvoiceId, PaymentId, LiabilityId, SettlementId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
