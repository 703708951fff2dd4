//! Vendor invoices and credit notes
//!
//! A credit note is an invoice with a negative gross amount. Both carry the
//! same fields and flow through the same ledger and liability rules.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, VendorId};
use crate::entity::LegalEntity;
use crate::error::PayablesError;

/// Lifecycle state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Active,
    /// Removed from every computation while keeping history
    Cancelled,
}

/// A vendor obligation recorded by one legal entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInvoice {
    pub id: InvoiceId,
    pub vendor_id: VendorId,
    /// Entity that recorded the invoice
    pub entity: LegalEntity,
    pub document_date: NaiveDate,
    /// Signed gross amount; negative for a credit note
    pub gross_amount: Money,
    /// Tax-exclusive amount as recorded, if any
    pub net_amount: Option<Money>,
    /// Whether the cost is split between the two entities
    pub shared: bool,
    pub status: InvoiceStatus,
    /// Vendor's own document number
    pub reference: Option<String>,
}

impl VendorInvoice {
    /// Creates an active, non-shared invoice without a recorded net amount
    pub fn new(
        vendor_id: VendorId,
        entity: LegalEntity,
        document_date: NaiveDate,
        gross_amount: Money,
    ) -> Self {
        Self {
            id: InvoiceId::new_v7(),
            vendor_id,
            entity,
            document_date,
            gross_amount,
            net_amount: None,
            shared: false,
            status: InvoiceStatus::Active,
            reference: None,
        }
    }

    pub fn with_id(mut self, id: InvoiceId) -> Self {
        self.id = id;
        self
    }

    pub fn with_net(mut self, net_amount: Money) -> Self {
        self.net_amount = Some(net_amount);
        self
    }

    /// Flags the invoice as split between the entities
    pub fn as_shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn is_credit_note(&self) -> bool {
        self.gross_amount.is_negative()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvoiceStatus::Cancelled
    }

    pub fn cancel(&mut self) {
        self.status = InvoiceStatus::Cancelled;
    }

    /// Returns the tax-exclusive amount, signed like the gross amount
    ///
    /// A recorded net amount is used as-is (its magnitude, with the gross
    /// sign). Otherwise the net is derived as `|gross| / vat_divisor`, rounded
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `PayablesError::DataIntegrity` naming this invoice when the net
    /// cannot be derived.
    pub fn net_amount(&self, vat_divisor: Decimal) -> Result<Money, PayablesError> {
        if let Some(net) = self.net_amount {
            return Ok(net.with_sign_of(self.gross_amount));
        }

        if vat_divisor <= Decimal::ZERO {
            return Err(PayablesError::data_integrity(
                self.id,
                format!("cannot derive net amount with divisor {}", vat_divisor),
            ));
        }

        let net = self
            .gross_amount
            .abs()
            .divide(vat_divisor)
            .map_err(|e| PayablesError::data_integrity(self.id, e.to_string()))?;

        Ok(net.with_sign_of(self.gross_amount))
    }
}
