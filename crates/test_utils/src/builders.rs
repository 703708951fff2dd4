//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use chrono::NaiveDate;
use core_kernel::{InvoiceId, Money, VendorId};
use domain_payables::{
    CrossEntityLiability, InMemoryPayablesStore, LegalEntity, PaymentMethod, VendorInvoice,
    VendorPayment,
};
use fake::faker::company::en::CompanyName;
use fake::Fake;

use crate::fixtures::DateFixtures;

/// A vendor with a generated company name
#[derive(Debug, Clone)]
pub struct TestVendor {
    pub id: VendorId,
    pub name: String,
}

impl TestVendor {
    pub fn new() -> Self {
        Self {
            id: VendorId::new(),
            name: CompanyName().fake(),
        }
    }

    /// Registers the vendor in an in-memory store
    pub async fn register(&self, store: &InMemoryPayablesStore) {
        store.add_vendor(self.id, self.name.clone()).await;
    }
}

impl Default for TestVendor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for vendor invoices and credit notes
pub struct InvoiceBuilder {
    vendor_id: VendorId,
    entity: LegalEntity,
    date: NaiveDate,
    gross: Money,
    net: Option<Money>,
    shared: bool,
    cancelled: bool,
    id: Option<InvoiceId>,
}

impl InvoiceBuilder {
    /// Creates a builder for an active, non-shared invoice of 1,000.00
    pub fn new(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            entity: LegalEntity::A,
            date: DateFixtures::jan(1),
            gross: Money::from_minor(100_000),
            net: None,
            shared: false,
            cancelled: false,
            id: None,
        }
    }

    pub fn entity(mut self, entity: LegalEntity) -> Self {
        self.entity = entity;
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Sets the gross amount in cents; negative for a credit note
    pub fn gross_cents(mut self, cents: i64) -> Self {
        self.gross = Money::from_minor(cents);
        self
    }

    pub fn net_cents(mut self, cents: i64) -> Self {
        self.net = Some(Money::from_minor(cents));
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn with_id(mut self, id: InvoiceId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn build(self) -> VendorInvoice {
        let reference = format!("FC-{:05}", (1..99_999u32).fake::<u32>());
        let mut invoice = VendorInvoice::new(self.vendor_id, self.entity, self.date, self.gross)
            .with_reference(reference);
        if let Some(id) = self.id {
            invoice = invoice.with_id(id);
        }
        if let Some(net) = self.net {
            invoice = invoice.with_net(net);
        }
        if self.shared {
            invoice = invoice.as_shared();
        }
        if self.cancelled {
            invoice.cancel();
        }
        invoice
    }
}

/// Builder for vendor payments
pub struct PaymentBuilder {
    invoice: VendorInvoice,
    date: NaiveDate,
    amount: Money,
    method: PaymentMethod,
}

impl PaymentBuilder {
    /// Pays the invoice in full on its document date by bank transfer
    pub fn for_invoice(invoice: &VendorInvoice) -> Self {
        Self {
            invoice: invoice.clone(),
            date: invoice.document_date,
            amount: invoice.gross_amount.abs(),
            method: PaymentMethod::BankTransfer,
        }
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn cents(mut self, cents: i64) -> Self {
        self.amount = Money::from_minor(cents);
        self
    }

    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn build(self) -> VendorPayment {
        VendorPayment::new(
            self.invoice.vendor_id,
            self.invoice.id,
            self.date,
            self.amount,
            self.method,
        )
    }
}

/// Builder for liability records in a given state
pub struct LiabilityBuilder {
    liability: CrossEntityLiability,
}

impl LiabilityBuilder {
    /// An outstanding liability where `payer` owes its complement
    pub fn owed_by(payer: LegalEntity, cents: i64) -> Self {
        let invoice_id = InvoiceId::new();
        let amount = Money::from_minor(cents);
        Self {
            liability: CrossEntityLiability {
                id: CrossEntityLiability::id_for(invoice_id),
                invoice_id,
                vendor_id: VendorId::new(),
                payer,
                receiver: payer.complement(),
                amount,
                remaining: amount,
                source_date: DateFixtures::jan(1),
                settled: amount.is_zero(),
                cancelled: false,
            },
        }
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.liability.source_date = date;
        self
    }

    pub fn vendor(mut self, vendor_id: VendorId) -> Self {
        self.liability.vendor_id = vendor_id;
        self
    }

    /// Sets the remaining amount as if settlements had been imputed
    pub fn remaining_cents(mut self, cents: i64) -> Self {
        self.liability.remaining = Money::from_minor(cents);
        self.liability.settled = cents == 0;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.liability.cancelled = true;
        self
    }

    pub fn build(self) -> CrossEntityLiability {
        self.liability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_builder_defaults() {
        let vendor = TestVendor::new();
        assert!(!vendor.name.is_empty());

        let invoice = InvoiceBuilder::new(vendor.id).gross_cents(-500).shared().build();
        assert!(invoice.is_credit_note());
        assert!(invoice.shared);
        assert!(invoice.reference.as_deref().is_some_and(|r| r.starts_with("FC-")));
    }

    #[test]
    fn test_payment_builder_pays_in_full() {
        let invoice = InvoiceBuilder::new(VendorId::new()).gross_cents(-2_500).build();
        let payment = PaymentBuilder::for_invoice(&invoice).build();
        assert_eq!(payment.amount.minor_units(), 2_500);
        assert_eq!(payment.invoice_id, invoice.id);
    }

    #[test]
    fn test_liability_builder_remaining() {
        let liability = LiabilityBuilder::owed_by(LegalEntity::A, 1_000).remaining_cents(0).build();
        assert!(liability.settled);
        assert!(!liability.is_outstanding());
    }
}
