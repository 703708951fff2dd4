//! Settlement DTOs

use chrono::NaiveDate;
use core_kernel::Money;
use domain_payables::{EntityPair, LegalEntity, PayablesError, SettlementRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSettlementRequest {
    pub payer: LegalEntity,
    pub receiver: LegalEntity,
    #[validate(custom(function = "validate_amount"))]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        let mut error = ValidationError::new("positive");
        error.message = Some("amount must be greater than zero".into());
        return Err(error);
    }
    if amount.normalize().scale() > 2 {
        let mut error = ValidationError::new("cents");
        error.message = Some("amount must not have more than two decimals".into());
        return Err(error);
    }
    Ok(())
}

impl CreateSettlementRequest {
    pub fn into_request(self) -> Result<SettlementRequest, PayablesError> {
        let pair = EntityPair::new(self.payer, self.receiver)?;
        let request = SettlementRequest::new(pair, Money::from_decimal(self.amount)?, self.payment_date)?;
        Ok(match self.note {
            Some(note) => request.with_note(note),
            None => request,
        })
    }
}
