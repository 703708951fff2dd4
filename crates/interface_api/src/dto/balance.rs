//! Balance DTOs

use domain_payables::{BalanceScope, LegalEntity, PayablesError};
use core_kernel::VendorId;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeParam {
    #[default]
    System,
    InterCompany,
    Vendor,
}

/// Query string of `GET /balances`
#[derive(Debug, Default, Deserialize)]
pub struct BalancesQuery {
    #[serde(default)]
    pub scope: ScopeParam,
    pub vendor_id: Option<Uuid>,
    pub entity: Option<LegalEntity>,
}

impl BalancesQuery {
    pub fn into_scope(self) -> Result<BalanceScope, PayablesError> {
        match self.scope {
            ScopeParam::System => Ok(BalanceScope::System),
            ScopeParam::InterCompany => Ok(BalanceScope::InterCompany),
            ScopeParam::Vendor => {
                let vendor_id = self
                    .vendor_id
                    .ok_or_else(|| PayablesError::validation("vendor scope requires vendor_id"))?;
                Ok(BalanceScope::Vendor {
                    vendor_id: VendorId::from_uuid(vendor_id),
                    entity: self.entity,
                })
            }
        }
    }
}
