//! PostgreSQL Payables Adapter
//!
//! Implements [`PayablesReadPort`] and [`PayablesWritePort`] on top of the
//! [`PayablesRepository`], translating rows into domain values.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresPayablesAdapter;
//! use std::sync::Arc;
//!
//! let adapter = Arc::new(PostgresPayablesAdapter::new(pool));
//! let engine = PayablesEngine::new(config, adapter.clone(), adapter);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, LiabilityId, Money,
    PaymentId, PortError, VendorId,
};
use domain_payables::{
    Allocation, CrossEntityLiability, DateRange, EntityPair, InvoiceStatus, LegalEntity,
    PayablesReadPort, PayablesWritePort, PaymentMethod, VendorDocuments, VendorInvoice,
    VendorPayment,
};

use crate::error::DatabaseError;
use crate::repositories::payables::{
    DbInvoiceStatus, DbLegalEntity, DbPaymentMethod, InvoiceRow, LiabilityRow, NewImputation,
    NewSettlement, PayablesRepository, PaymentRow, RemainingUpdate,
};

/// PostgreSQL-backed implementation of the payables ports
///
/// # Error Handling
///
/// - Missing rows -> `PortError::NotFound`
/// - Serialization failures and failed compare-and-swap -> `PortError::Conflict`
/// - Unmappable stored values -> `PortError::Transformation`
#[derive(Debug, Clone)]
pub struct PostgresPayablesAdapter {
    repository: PayablesRepository,
    pool: PgPool,
}

impl PostgresPayablesAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PayablesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &PayablesRepository {
        &self.repository
    }

    /// Registers a vendor; an existing vendor is left untouched
    pub async fn insert_vendor(&self, vendor_id: VendorId, name: &str) -> Result<(), PortError> {
        self.repository
            .insert_vendor(*vendor_id.as_uuid(), name)
            .await?;
        Ok(())
    }

    /// Records an invoice or credit note
    pub async fn insert_invoice(&self, invoice: &VendorInvoice) -> Result<(), PortError> {
        self.repository.insert_invoice(&invoice_to_row(invoice)).await?;
        Ok(())
    }

    /// Records a vendor payment
    pub async fn insert_payment(&self, payment: &VendorPayment) -> Result<(), PortError> {
        self.repository.insert_payment(&payment_to_row(payment)).await?;
        Ok(())
    }
}

impl DomainPort for PostgresPayablesAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPayablesAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: "postgres-payables-adapter".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl PayablesReadPort for PostgresPayablesAdapter {
    #[instrument(skip(self))]
    async fn list_vendors(&self) -> Result<Vec<VendorId>, PortError> {
        let ids = self.repository.list_vendor_ids().await?;
        Ok(ids.into_iter().map(VendorId::from_uuid).collect())
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    async fn fetch_vendor_documents(
        &self,
        vendor_id: VendorId,
        range: DateRange,
    ) -> Result<VendorDocuments, PortError> {
        let vendor = *vendor_id.as_uuid();
        if !self.repository.vendor_exists(vendor).await? {
            return Err(PortError::not_found("Vendor", vendor_id));
        }

        let invoice_rows = self
            .repository
            .invoices_for_vendor(vendor, range.from, range.to)
            .await?;
        let invoice_ids: Vec<_> = invoice_rows.iter().map(|r| r.invoice_id).collect();
        let payment_rows = self.repository.payments_for_invoices(&invoice_ids).await?;
        debug!(
            invoices = invoice_rows.len(),
            payments = payment_rows.len(),
            "Loaded vendor documents"
        );

        Ok(VendorDocuments {
            invoices: invoice_rows
                .into_iter()
                .map(invoice_from_row)
                .collect::<Result<_, _>>()?,
            payments: payment_rows
                .into_iter()
                .map(payment_from_row)
                .collect::<Result<_, _>>()?,
        })
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<VendorInvoice, PortError> {
        let row = self
            .repository
            .find_invoice(*invoice_id.as_uuid())
            .await?
            .ok_or_else(|| PortError::not_found("Invoice", invoice_id))?;
        Ok(invoice_from_row(row)?)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn fetch_liability_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Option<CrossEntityLiability>, PortError> {
        let row = self
            .repository
            .find_liability_by_invoice(*invoice_id.as_uuid())
            .await?;
        Ok(row.map(liability_from_row).transpose()?)
    }

    #[instrument(skip(self), fields(pair = %pair))]
    async fn fetch_liabilities(&self, pair: EntityPair) -> Result<Vec<CrossEntityLiability>, PortError> {
        let rows = self
            .repository
            .liabilities_between(entity_to_db(pair.payer()), entity_to_db(pair.receiver()))
            .await?;
        debug!(count = rows.len(), "Loaded liabilities");
        Ok(rows
            .into_iter()
            .map(liability_from_row)
            .collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl PayablesWritePort for PostgresPayablesAdapter {
    #[instrument(skip(self, liability, expected), fields(liability_id = %liability.id))]
    async fn upsert_liability(
        &self,
        liability: &CrossEntityLiability,
        expected: Option<&CrossEntityLiability>,
    ) -> Result<(), PortError> {
        let row = liability_to_row(liability);
        match expected {
            None => self.repository.insert_liability(&row).await?,
            Some(expected) => {
                self.repository
                    .replace_liability(&row, &liability_to_row(expected))
                    .await?
            }
        }
        Ok(())
    }

    #[instrument(skip(self, allocation), fields(settlement_id = %allocation.settlement.id))]
    async fn commit_settlement(&self, allocation: &Allocation) -> Result<(), PortError> {
        let settlement = &allocation.settlement;
        let header = NewSettlement {
            settlement_id: *settlement.id.as_uuid(),
            payer: entity_to_db(settlement.payer),
            receiver: entity_to_db(settlement.receiver),
            amount: settlement.amount.to_decimal(),
            payment_date: settlement.payment_date,
            note: settlement.note.clone(),
            unimputed_remainder: settlement.unimputed_remainder.to_decimal(),
        };
        let imputations: Vec<NewImputation> = settlement
            .imputations
            .iter()
            .map(|i| NewImputation {
                liability_id: *i.liability_id.as_uuid(),
                amount: i.amount.to_decimal(),
            })
            .collect();
        let updates: Vec<RemainingUpdate> = allocation
            .updates
            .iter()
            .map(|u| RemainingUpdate {
                liability_id: *u.liability_id.as_uuid(),
                expected_remaining: u.expected_remaining.to_decimal(),
                new_remaining: u.new_remaining.to_decimal(),
                settled: u.settled,
            })
            .collect();

        self.repository
            .commit_settlement(&header, &imputations, &updates)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn money(value: Decimal, column: &str) -> Result<Money, DatabaseError> {
    Money::from_decimal(value)
        .map_err(|e| DatabaseError::InvalidData(format!("{}: {}", column, e)))
}

pub(crate) fn entity_to_db(entity: LegalEntity) -> DbLegalEntity {
    match entity {
        LegalEntity::A => DbLegalEntity::A,
        LegalEntity::B => DbLegalEntity::B,
    }
}

fn entity_from_db(entity: DbLegalEntity) -> LegalEntity {
    match entity {
        DbLegalEntity::A => LegalEntity::A,
        DbLegalEntity::B => LegalEntity::B,
    }
}

pub(crate) fn status_to_db(status: InvoiceStatus) -> DbInvoiceStatus {
    match status {
        InvoiceStatus::Active => DbInvoiceStatus::Active,
        InvoiceStatus::Cancelled => DbInvoiceStatus::Cancelled,
    }
}

pub(crate) fn method_to_db(method: PaymentMethod) -> DbPaymentMethod {
    match method {
        PaymentMethod::BankTransfer => DbPaymentMethod::BankTransfer,
        PaymentMethod::Check => DbPaymentMethod::Check,
        PaymentMethod::ElectronicCheck => DbPaymentMethod::ElectronicCheck,
        PaymentMethod::Cash => DbPaymentMethod::Cash,
        PaymentMethod::Other => DbPaymentMethod::Other,
    }
}

fn method_from_db(method: DbPaymentMethod) -> PaymentMethod {
    match method {
        DbPaymentMethod::BankTransfer => PaymentMethod::BankTransfer,
        DbPaymentMethod::Check => PaymentMethod::Check,
        DbPaymentMethod::ElectronicCheck => PaymentMethod::ElectronicCheck,
        DbPaymentMethod::Cash => PaymentMethod::Cash,
        DbPaymentMethod::Other => PaymentMethod::Other,
    }
}

fn invoice_from_row(row: InvoiceRow) -> Result<VendorInvoice, DatabaseError> {
    Ok(VendorInvoice {
        id: InvoiceId::from_uuid(row.invoice_id),
        vendor_id: VendorId::from_uuid(row.vendor_id),
        entity: entity_from_db(row.entity),
        document_date: row.document_date,
        gross_amount: money(row.gross_amount, "gross_amount")?,
        net_amount: row.net_amount.map(|n| money(n, "net_amount")).transpose()?,
        shared: row.shared,
        status: match row.status {
            DbInvoiceStatus::Active => InvoiceStatus::Active,
            DbInvoiceStatus::Cancelled => InvoiceStatus::Cancelled,
        },
        reference: row.reference,
    })
}

pub(crate) fn invoice_to_row(invoice: &VendorInvoice) -> InvoiceRow {
    InvoiceRow {
        invoice_id: *invoice.id.as_uuid(),
        vendor_id: *invoice.vendor_id.as_uuid(),
        entity: entity_to_db(invoice.entity),
        document_date: invoice.document_date,
        gross_amount: invoice.gross_amount.to_decimal(),
        net_amount: invoice.net_amount.map(|n| n.to_decimal()),
        shared: invoice.shared,
        status: status_to_db(invoice.status),
        reference: invoice.reference.clone(),
    }
}

fn payment_from_row(row: PaymentRow) -> Result<VendorPayment, DatabaseError> {
    Ok(VendorPayment {
        id: PaymentId::from_uuid(row.payment_id),
        vendor_id: VendorId::from_uuid(row.vendor_id),
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        payment_date: row.payment_date,
        amount: money(row.amount, "amount")?,
        method: method_from_db(row.method),
    })
}

pub(crate) fn payment_to_row(payment: &VendorPayment) -> PaymentRow {
    PaymentRow {
        payment_id: *payment.id.as_uuid(),
        vendor_id: *payment.vendor_id.as_uuid(),
        invoice_id: *payment.invoice_id.as_uuid(),
        payment_date: payment.payment_date,
        amount: payment.amount.to_decimal(),
        method: method_to_db(payment.method),
    }
}

fn liability_from_row(row: LiabilityRow) -> Result<CrossEntityLiability, DatabaseError> {
    if row.payer == row.receiver {
        return Err(DatabaseError::InvalidData(format!(
            "liability {} has payer equal to receiver",
            row.liability_id
        )));
    }
    Ok(CrossEntityLiability {
        id: LiabilityId::from_uuid(row.liability_id),
        invoice_id: InvoiceId::from_uuid(row.invoice_id),
        vendor_id: VendorId::from_uuid(row.vendor_id),
        payer: entity_from_db(row.payer),
        receiver: entity_from_db(row.receiver),
        amount: money(row.amount, "amount")?,
        remaining: money(row.remaining_amount, "remaining_amount")?,
        source_date: row.source_date,
        settled: row.settled,
        cancelled: row.cancelled,
    })
}

fn liability_to_row(liability: &CrossEntityLiability) -> LiabilityRow {
    LiabilityRow {
        liability_id: *liability.id.as_uuid(),
        invoice_id: *liability.invoice_id.as_uuid(),
        vendor_id: *liability.vendor_id.as_uuid(),
        payer: entity_to_db(liability.payer),
        receiver: entity_to_db(liability.receiver),
        amount: liability.amount.to_decimal(),
        remaining_amount: liability.remaining.to_decimal(),
        source_date: liability.source_date,
        settled: liability.settled,
        cancelled: liability.cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_liability_row_round_trip() {
        let invoice_id = InvoiceId::new();
        let liability = CrossEntityLiability {
            id: CrossEntityLiability::id_for(invoice_id),
            invoice_id,
            vendor_id: VendorId::new(),
            payer: LegalEntity::A,
            receiver: LegalEntity::B,
            amount: Money::from_minor(-3_500_000),
            remaining: Money::from_minor(-1_000_000),
            source_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            settled: false,
            cancelled: false,
        };
        let row = liability_to_row(&liability);
        assert_eq!(row.amount, dec!(-35000.00));
        assert_eq!(liability_from_row(row).unwrap(), liability);
    }

    #[test]
    fn test_liability_row_rejects_same_parties() {
        let mut row = liability_to_row(&CrossEntityLiability {
            id: LiabilityId::new(),
            invoice_id: InvoiceId::new(),
            vendor_id: VendorId::new(),
            payer: LegalEntity::A,
            receiver: LegalEntity::B,
            amount: Money::from_minor(1),
            remaining: Money::from_minor(1),
            source_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            settled: false,
            cancelled: false,
        });
        row.receiver = DbLegalEntity::A;
        assert!(matches!(liability_from_row(row), Err(DatabaseError::InvalidData(_))));
    }

    #[test]
    fn test_invoice_row_keeps_sub_cent_rounding_out() {
        let row = InvoiceRow {
            invoice_id: InvoiceId::new().into(),
            vendor_id: VendorId::new().into(),
            entity: DbLegalEntity::B,
            document_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
            gross_amount: dec!(121000.00),
            net_amount: None,
            shared: true,
            status: DbInvoiceStatus::Active,
            reference: Some("FC-1".to_string()),
        };
        let invoice = invoice_from_row(row).unwrap();
        assert_eq!(invoice.gross_amount.minor_units(), 12_100_000);
        assert_eq!(invoice.entity, LegalEntity::B);
        assert_eq!(invoice_to_row(&invoice).gross_amount, dec!(121000.00));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn numeric_columns_keep_every_cent(cents in -1_000_000_000_000i64..1_000_000_000_000i64) {
                let column = Decimal::new(cents, 2);
                let value = money(column, "amount").unwrap();
                prop_assert_eq!(value.minor_units(), cents);
                prop_assert_eq!(value.to_decimal(), column);
            }
        }
    }
}
