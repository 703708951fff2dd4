//! Vendor ledger entries
//!
//! Invoices, credit notes and vendor payments are projected into a single
//! ordered sequence of debit and credit entries. The projection validates the
//! raw documents first and never repairs them: an inconsistent record is a
//! data-integrity error naming the offending document.
//!
//! # Ordering
//!
//! Entries are sorted by date, then by [`DocumentRef`]. On the same date an
//! invoice sorts before any payment, and documents of the same kind sort by
//! id. The order is total, so the same documents always produce the same
//! sequence.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PaymentId, VendorId};
use crate::entity::LegalEntity;
use crate::error::PayablesError;
use crate::invoice::VendorInvoice;
use crate::payment::VendorPayment;

/// Direction of a ledger entry
///
/// Debits increase what the recording entity owes the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl EntryDirection {
    /// Returns the magnitude signed for balance arithmetic
    pub fn signed(self, magnitude: Money) -> Money {
        match self {
            EntryDirection::Debit => magnitude,
            EntryDirection::Credit => -magnitude,
        }
    }
}

/// The source document of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DocumentRef {
    Invoice(InvoiceId),
    Payment(PaymentId),
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::Invoice(id) => write!(f, "{}", id),
            DocumentRef::Payment(id) => write!(f, "{}", id),
        }
    }
}

/// A normalized projection of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub direction: EntryDirection,
    /// Never negative
    pub magnitude: Money,
    pub document: DocumentRef,
    /// Invoice the entry belongs to (the document itself for invoices)
    pub invoice_id: InvoiceId,
    pub entity: LegalEntity,
}

impl LedgerEntry {
    /// Signed contribution to the running balance
    pub fn signed_amount(&self) -> Money {
        self.direction.signed(self.magnitude)
    }

    fn sort_key(&self) -> (NaiveDate, DocumentRef) {
        (self.date, self.document)
    }
}

/// Inclusive date bounds, each optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a range, rejecting `from` after `to`
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, PayablesError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(PayablesError::validation(format!(
                    "Date range start {} is after its end {}",
                    from, to
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Everything up to and including `to`
    pub fn until(to: Option<NaiveDate>) -> Self {
        Self { from: None, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Filters applied when building a vendor ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub entity: Option<LegalEntity>,
    pub range: DateRange,
}

impl LedgerFilter {
    /// No entity filter, full history
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }
}

/// Raw documents for one vendor as returned by the read port
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorDocuments {
    pub invoices: Vec<VendorInvoice>,
    pub payments: Vec<VendorPayment>,
}

/// Projects a vendor's documents into ordered ledger entries
#[derive(Debug, Clone, Copy)]
pub struct LedgerEntryBuilder {
    vendor_id: VendorId,
}

impl LedgerEntryBuilder {
    pub fn new(vendor_id: VendorId) -> Self {
        Self { vendor_id }
    }

    /// Validates the documents and returns the sorted entries
    ///
    /// Validation covers every document handed in, cancelled or not, before
    /// the entity filter is applied. Cancelled invoices and their payments are
    /// then excluded. No date filtering happens here: a [`DateRange`] is
    /// applied by `VendorLedgerView::from_entries`, which folds the earlier
    /// entries into the opening balance.
    ///
    /// # Errors
    ///
    /// `PayablesError::DataIntegrity` when a document belongs to another
    /// vendor, an invoice id repeats, a payment amount is not positive, a
    /// payment references an unknown invoice, or payments on an active invoice
    /// exceed its absolute gross amount.
    pub fn build(
        &self,
        documents: &VendorDocuments,
        entity: Option<LegalEntity>,
    ) -> Result<Vec<LedgerEntry>, PayablesError> {
        let includes_entity = |candidate: LegalEntity| entity.map_or(true, |e| e == candidate);

        let invoices = self.index_invoices(&documents.invoices)?;
        let paid = self.validate_payments(&invoices, &documents.payments)?;

        for (invoice_id, total) in &paid {
            let invoice = invoices[invoice_id];
            if !invoice.is_cancelled() && *total > invoice.gross_amount.abs() {
                return Err(PayablesError::data_integrity(
                    invoice_id,
                    format!(
                        "payments of {} exceed gross amount {}",
                        total,
                        invoice.gross_amount.abs()
                    ),
                ));
            }
        }

        let mut entries = Vec::with_capacity(documents.invoices.len() + documents.payments.len());

        for invoice in &documents.invoices {
            if invoice.is_cancelled() || !includes_entity(invoice.entity) {
                continue;
            }
            let direction = if invoice.gross_amount.is_negative() {
                EntryDirection::Credit
            } else {
                EntryDirection::Debit
            };
            entries.push(LedgerEntry {
                date: invoice.document_date,
                direction,
                magnitude: invoice.gross_amount.abs(),
                document: DocumentRef::Invoice(invoice.id),
                invoice_id: invoice.id,
                entity: invoice.entity,
            });
        }

        for payment in &documents.payments {
            let invoice = invoices[&payment.invoice_id];
            if invoice.is_cancelled() || !includes_entity(invoice.entity) {
                continue;
            }
            entries.push(LedgerEntry {
                date: payment.payment_date,
                direction: EntryDirection::Credit,
                magnitude: payment.amount,
                document: DocumentRef::Payment(payment.id),
                invoice_id: invoice.id,
                entity: invoice.entity,
            });
        }

        entries.sort_by_key(LedgerEntry::sort_key);
        Ok(entries)
    }

    fn index_invoices<'a>(
        &self,
        invoices: &'a [VendorInvoice],
    ) -> Result<HashMap<InvoiceId, &'a VendorInvoice>, PayablesError> {
        let mut index = HashMap::with_capacity(invoices.len());
        for invoice in invoices {
            if invoice.vendor_id != self.vendor_id {
                return Err(PayablesError::data_integrity(
                    invoice.id,
                    format!("invoice belongs to vendor {}", invoice.vendor_id),
                ));
            }
            if index.insert(invoice.id, invoice).is_some() {
                return Err(PayablesError::data_integrity(invoice.id, "duplicate invoice id"));
            }
        }
        Ok(index)
    }

    fn validate_payments(
        &self,
        invoices: &HashMap<InvoiceId, &VendorInvoice>,
        payments: &[VendorPayment],
    ) -> Result<HashMap<InvoiceId, Money>, PayablesError> {
        let mut paid: HashMap<InvoiceId, Money> = HashMap::new();
        for payment in payments {
            if payment.vendor_id != self.vendor_id {
                return Err(PayablesError::data_integrity(
                    payment.id,
                    format!("payment belongs to vendor {}", payment.vendor_id),
                ));
            }
            if !payment.amount.is_positive() {
                return Err(PayablesError::data_integrity(
                    payment.id,
                    format!("payment amount must be positive, got {}", payment.amount),
                ));
            }
            if !invoices.contains_key(&payment.invoice_id) {
                return Err(PayablesError::data_integrity(
                    payment.id,
                    format!("payment references unknown invoice {}", payment.invoice_id),
                ));
            }
            let total = paid.entry(payment.invoice_id).or_insert(Money::ZERO);
            *total = total.checked_add(&payment.amount)?;
        }
        Ok(paid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::from_decimal(amount).unwrap()
    }

    #[test]
    fn test_invoice_debit_and_credit_note_credit() {
        let vendor = VendorId::new();
        let invoice = VendorInvoice::new(vendor, LegalEntity::A, date(1), money(dec!(1000)));
        let credit = VendorInvoice::new(vendor, LegalEntity::A, date(2), money(dec!(-200)));
        let docs = VendorDocuments {
            invoices: vec![credit.clone(), invoice.clone()],
            payments: vec![],
        };

        let entries = LedgerEntryBuilder::new(vendor).build(&docs, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].document, DocumentRef::Invoice(invoice.id));
        assert_eq!(entries[0].direction, EntryDirection::Debit);
        assert_eq!(entries[1].direction, EntryDirection::Credit);
        assert_eq!(entries[1].magnitude, money(dec!(200)));
    }

    #[test]
    fn test_invoice_sorts_before_payment_on_same_date() {
        let vendor = VendorId::new();
        let invoice = VendorInvoice::new(vendor, LegalEntity::B, date(5), money(dec!(500)));
        let payment = VendorPayment::new(vendor, invoice.id, date(5), money(dec!(500)), PaymentMethod::Cash);
        let docs = VendorDocuments {
            invoices: vec![invoice.clone()],
            payments: vec![payment.clone()],
        };

        let entries = LedgerEntryBuilder::new(vendor).build(&docs, None).unwrap();
        assert_eq!(entries[0].document, DocumentRef::Invoice(invoice.id));
        assert_eq!(entries[1].document, DocumentRef::Payment(payment.id));
        assert_eq!(entries[1].entity, LegalEntity::B);
    }

    #[test]
    fn test_cancelled_invoice_and_its_payments_excluded() {
        let vendor = VendorId::new();
        let mut invoice = VendorInvoice::new(vendor, LegalEntity::A, date(1), money(dec!(500)));
        invoice.cancel();
        let payment = VendorPayment::new(vendor, invoice.id, date(2), money(dec!(100)), PaymentMethod::Check);
        let docs = VendorDocuments {
            invoices: vec![invoice],
            payments: vec![payment],
        };

        let entries = LedgerEntryBuilder::new(vendor).build(&docs, None).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_entity_filter() {
        let vendor = VendorId::new();
        let a = VendorInvoice::new(vendor, LegalEntity::A, date(1), money(dec!(100)));
        let b = VendorInvoice::new(vendor, LegalEntity::B, date(1), money(dec!(200)));
        let docs = VendorDocuments {
            invoices: vec![a, b.clone()],
            payments: vec![],
        };

        let entries = LedgerEntryBuilder::new(vendor)
            .build(&docs, Some(LegalEntity::B))
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].invoice_id, b.id);
    }

    #[test]
    fn test_orphan_payment_names_payment() {
        let vendor = VendorId::new();
        let payment = VendorPayment::new(vendor, InvoiceId::new(), date(1), money(dec!(10)), PaymentMethod::Other);
        let docs = VendorDocuments {
            invoices: vec![],
            payments: vec![payment.clone()],
        };

        let err = LedgerEntryBuilder::new(vendor)
            .build(&docs, None)
            .unwrap_err();
        assert!(matches!(err, PayablesError::DataIntegrity { ref document_id, .. } if *document_id == payment.id.to_string()));
    }

    #[test]
    fn test_overpayment_names_invoice() {
        let vendor = VendorId::new();
        let invoice = VendorInvoice::new(vendor, LegalEntity::A, date(1), money(dec!(100)));
        let docs = VendorDocuments {
            invoices: vec![invoice.clone()],
            payments: vec![
                VendorPayment::new(vendor, invoice.id, date(2), money(dec!(60)), PaymentMethod::BankTransfer),
                VendorPayment::new(vendor, invoice.id, date(3), money(dec!(40.01)), PaymentMethod::BankTransfer),
            ],
        };

        let err = LedgerEntryBuilder::new(vendor)
            .build(&docs, None)
            .unwrap_err();
        assert!(matches!(err, PayablesError::DataIntegrity { ref document_id, .. } if *document_id == invoice.id.to_string()));
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let vendor = VendorId::new();
        let invoice = VendorInvoice::new(vendor, LegalEntity::A, date(1), money(dec!(100)));
        let docs = VendorDocuments {
            invoices: vec![invoice.clone()],
            payments: vec![VendorPayment::new(vendor, invoice.id, date(2), Money::ZERO, PaymentMethod::Cash)],
        };

        assert!(LedgerEntryBuilder::new(vendor).build(&docs, None).is_err());
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::new(Some(date(5)), Some(date(1))).is_err());
        let range = DateRange::new(Some(date(1)), Some(date(5))).unwrap();
        assert!(range.contains(date(1)));
        assert!(range.contains(date(5)));
        assert!(!range.contains(date(6)));
        assert!(DateRange::unbounded().contains(date(31)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::payment::PaymentMethod;
    use proptest::prelude::*;

    fn documents(specs: &[(u32, i64, bool, bool)]) -> (VendorId, VendorDocuments) {
        let vendor = VendorId::new();
        let mut docs = VendorDocuments::default();
        for &(day, cents, entity_a, paid) in specs {
            let entity = if entity_a { LegalEntity::A } else { LegalEntity::B };
            let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
            let invoice = VendorInvoice::new(vendor, entity, date, Money::from_minor(cents));
            if paid {
                // Same date as the invoice, and as other documents of that day
                let amount = Money::from_minor((cents.abs() / 2).max(1));
                docs.payments.push(VendorPayment::new(vendor, invoice.id, date, amount, PaymentMethod::BankTransfer));
            }
            docs.invoices.push(invoice);
        }
        (vendor, docs)
    }

    proptest! {
        #[test]
        fn build_ignores_input_order(
            specs in prop::collection::vec((1u32..=3, 1i64..1_000_000, any::<bool>(), any::<bool>()), 1..12),
            rotation in 0usize..12
        ) {
            let (vendor, docs) = documents(&specs);
            let builder = LedgerEntryBuilder::new(vendor);
            let expected = builder.build(&docs, None).unwrap();

            let mut reordered = docs.clone();
            reordered.invoices.reverse();
            let shift = rotation % reordered.payments.len().max(1);
            reordered.payments.rotate_left(shift);

            prop_assert_eq!(builder.build(&reordered, None).unwrap(), expected.clone());
            prop_assert_eq!(builder.build(&docs, None).unwrap(), expected.clone());

            for pair in expected.windows(2) {
                prop_assert!((pair[0].date, pair[0].document) < (pair[1].date, pair[1].document));
            }
        }
    }
}
