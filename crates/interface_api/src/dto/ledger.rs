//! Ledger DTOs

use chrono::NaiveDate;
use domain_payables::{DateRange, LedgerFilter, LegalEntity, PayablesError};
use serde::Deserialize;

/// Query string of `GET /vendors/:id/ledger`
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub entity: Option<LegalEntity>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LedgerQuery {
    /// Rejects `from` after `to`
    pub fn into_filter(self) -> Result<LedgerFilter, PayablesError> {
        Ok(LedgerFilter {
            entity: self.entity,
            range: DateRange::new(self.from, self.to)?,
        })
    }
}
