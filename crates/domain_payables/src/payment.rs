//! Vendor-directed payments

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PaymentId, VendorId};

/// How a vendor payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Check,
    ElectronicCheck,
    Cash,
    Other,
}

/// A payment that reduces one invoice's outstanding balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPayment {
    pub id: PaymentId,
    pub vendor_id: VendorId,
    pub invoice_id: InvoiceId,
    pub payment_date: NaiveDate,
    /// Always positive when valid
    pub amount: Money,
    pub method: PaymentMethod,
}

impl VendorPayment {
    pub fn new(
        vendor_id: VendorId,
        invoice_id: InvoiceId,
        payment_date: NaiveDate,
        amount: Money,
        method: PaymentMethod,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            vendor_id,
            invoice_id,
            payment_date,
            amount,
            method,
        }
    }

    pub fn with_id(mut self, id: PaymentId) -> Self {
        self.id = id;
        self
    }
}
