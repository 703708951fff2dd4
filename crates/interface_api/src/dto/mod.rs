//! Request and response bodies

pub mod ledger;
pub mod liability;
pub mod settlement;
pub mod balance;
