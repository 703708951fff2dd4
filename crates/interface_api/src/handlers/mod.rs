//! Request handlers

pub mod health;
pub mod ledger;
pub mod liabilities;
pub mod settlements;
pub mod balances;
