//! Payables repository implementation
//!
//! Database access for vendor documents, cross-entity liabilities and
//! settlements. Balances are never read from the database; only the facts
//! they are derived from.
//!
//! Settlement commits run in a SERIALIZABLE transaction and update each
//! liability with a compare-and-swap on `remaining_amount`. Liability writes
//! from a sync are conditional on the row they were reconciled against.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Legal entity as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "legal_entity", rename_all = "UPPERCASE")]
pub enum DbLegalEntity {
    A,
    B,
}

/// Invoice lifecycle as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
pub enum DbInvoiceStatus {
    Active,
    Cancelled,
}

/// Payment method as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum DbPaymentMethod {
    BankTransfer,
    Check,
    ElectronicCheck,
    Cash,
    Other,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub vendor_id: Uuid,
    pub entity: DbLegalEntity,
    pub document_date: NaiveDate,
    pub gross_amount: Decimal,
    pub net_amount: Option<Decimal>,
    pub shared: bool,
    pub status: DbInvoiceStatus,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub vendor_id: Uuid,
    pub invoice_id: Uuid,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: DbPaymentMethod,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LiabilityRow {
    pub liability_id: Uuid,
    pub invoice_id: Uuid,
    pub vendor_id: Uuid,
    pub payer: DbLegalEntity,
    pub receiver: DbLegalEntity,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub source_date: NaiveDate,
    pub settled: bool,
    pub cancelled: bool,
}

/// Settlement header to insert
#[derive(Debug, Clone)]
pub struct NewSettlement {
    pub settlement_id: Uuid,
    pub payer: DbLegalEntity,
    pub receiver: DbLegalEntity,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub unimputed_remainder: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewImputation {
    pub liability_id: Uuid,
    pub amount: Decimal,
}

/// Compare-and-swap of one liability's remaining amount
#[derive(Debug, Clone)]
pub struct RemainingUpdate {
    pub liability_id: Uuid,
    pub expected_remaining: Decimal,
    pub new_remaining: Decimal,
    pub settled: bool,
}

const INVOICE_COLUMNS: &str = "invoice_id, vendor_id, entity, document_date, gross_amount, \
     net_amount, shared, status, reference";

const LIABILITY_COLUMNS: &str = "liability_id, invoice_id, vendor_id, payer, receiver, amount, \
     remaining_amount, source_date, settled, cancelled";

/// Repository for payables documents and settlements
#[derive(Debug, Clone)]
pub struct PayablesRepository {
    pool: PgPool,
}

impl PayablesRepository {
    /// Creates a new PayablesRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_vendor_ids(&self) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT vendor_id FROM vendors ORDER BY vendor_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn vendor_exists(&self, vendor_id: Uuid) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM vendors WHERE vendor_id = $1)",
        )
        .bind(vendor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Inserts a vendor, ignoring an existing one
    pub async fn insert_vendor(&self, vendor_id: Uuid, name: &str) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO vendors (vendor_id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(vendor_id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Invoices of a vendor with a document date in the inclusive bounds
    pub async fn invoices_for_vendor(
        &self,
        vendor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM vendor_invoices \
             WHERE vendor_id = $1 \
               AND ($2::date IS NULL OR document_date >= $2) \
               AND ($3::date IS NULL OR document_date <= $3) \
             ORDER BY document_date, invoice_id"
        );
        let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(vendor_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Payments referencing any of the given invoices
    pub async fn payments_for_invoices(&self, invoice_ids: &[Uuid]) -> Result<Vec<PaymentRow>, DatabaseError> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT payment_id, vendor_id, invoice_id, payment_date, amount, method \
             FROM vendor_payments WHERE invoice_id = ANY($1) \
             ORDER BY payment_date, payment_id",
        )
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceRow>, DatabaseError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM vendor_invoices WHERE invoice_id = $1");
        let row = sqlx::query_as::<_, InvoiceRow>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn insert_invoice(&self, row: &InvoiceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO vendor_invoices (invoice_id, vendor_id, entity, document_date, \
             gross_amount, net_amount, shared, status, reference) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(row.invoice_id)
        .bind(row.vendor_id)
        .bind(row.entity)
        .bind(row.document_date)
        .bind(row.gross_amount)
        .bind(row.net_amount)
        .bind(row.shared)
        .bind(row.status)
        .bind(&row.reference)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_payment(&self, row: &PaymentRow) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO vendor_payments (payment_id, vendor_id, invoice_id, payment_date, amount, method) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(row.payment_id)
        .bind(row.vendor_id)
        .bind(row.invoice_id)
        .bind(row.payment_date)
        .bind(row.amount)
        .bind(row.method)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_liability_by_invoice(&self, invoice_id: Uuid) -> Result<Option<LiabilityRow>, DatabaseError> {
        let sql = format!("SELECT {LIABILITY_COLUMNS} FROM cross_entity_liabilities WHERE invoice_id = $1");
        let row = sqlx::query_as::<_, LiabilityRow>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Non-cancelled liabilities stored in either direction between two entities
    pub async fn liabilities_between(
        &self,
        first: DbLegalEntity,
        second: DbLegalEntity,
    ) -> Result<Vec<LiabilityRow>, DatabaseError> {
        let sql = format!(
            "SELECT {LIABILITY_COLUMNS} FROM cross_entity_liabilities \
             WHERE cancelled = FALSE \
               AND ((payer = $1 AND receiver = $2) OR (payer = $2 AND receiver = $1)) \
             ORDER BY source_date, liability_id"
        );
        let rows = sqlx::query_as::<_, LiabilityRow>(&sql)
            .bind(first)
            .bind(second)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a liability that must not exist yet
    ///
    /// Returns `DatabaseError::Conflict` if a row with the same id was
    /// written in the meantime.
    pub async fn insert_liability(&self, row: &LiabilityRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO cross_entity_liabilities (liability_id, invoice_id, vendor_id, payer, \
             receiver, amount, remaining_amount, source_date, settled, cancelled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (liability_id) DO NOTHING",
        )
        .bind(row.liability_id)
        .bind(row.invoice_id)
        .bind(row.vendor_id)
        .bind(row.payer)
        .bind(row.receiver)
        .bind(row.amount)
        .bind(row.remaining_amount)
        .bind(row.source_date)
        .bind(row.settled)
        .bind(row.cancelled)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Conflict(format!(
                "liability {} already exists",
                row.liability_id
            )));
        }
        Ok(())
    }

    /// Replaces a liability while it still matches `expected`
    ///
    /// Compares direction, amount, remaining amount and flags. A row that
    /// changed since it was read is left alone and `DatabaseError::Conflict`
    /// is returned.
    pub async fn replace_liability(
        &self,
        row: &LiabilityRow,
        expected: &LiabilityRow,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE cross_entity_liabilities SET \
                 payer = $2, receiver = $3, amount = $4, remaining_amount = $5, \
                 source_date = $6, settled = $7, cancelled = $8, updated_at = now() \
             WHERE liability_id = $1 \
               AND payer = $9 AND receiver = $10 AND amount = $11 \
               AND remaining_amount = $12 AND settled = $13 AND cancelled = $14",
        )
        .bind(row.liability_id)
        .bind(row.payer)
        .bind(row.receiver)
        .bind(row.amount)
        .bind(row.remaining_amount)
        .bind(row.source_date)
        .bind(row.settled)
        .bind(row.cancelled)
        .bind(expected.payer)
        .bind(expected.receiver)
        .bind(expected.amount)
        .bind(expected.remaining_amount)
        .bind(expected.settled)
        .bind(expected.cancelled)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::Conflict(format!(
                "liability {} changed since it was read",
                row.liability_id
            )));
        }
        Ok(())
    }

    /// Persists a settlement with its imputations and liability updates
    ///
    /// Either everything is written or nothing is. A compare-and-swap that
    /// matches no row rolls the transaction back with
    /// `DatabaseError::Conflict`.
    pub async fn commit_settlement(
        &self,
        settlement: &NewSettlement,
        imputations: &[NewImputation],
        updates: &[RemainingUpdate],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        for update in updates {
            let result = sqlx::query(
                "UPDATE cross_entity_liabilities \
                 SET remaining_amount = $2, settled = $3, updated_at = now() \
                 WHERE liability_id = $1 AND remaining_amount = $4 AND cancelled = FALSE",
            )
            .bind(update.liability_id)
            .bind(update.new_remaining)
            .bind(update.settled)
            .bind(update.expected_remaining)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(DatabaseError::Conflict(format!(
                    "liability {} no longer has remaining amount {}",
                    update.liability_id, update.expected_remaining
                )));
            }
        }

        sqlx::query(
            "INSERT INTO settlement_payments (settlement_id, payer, receiver, amount, \
             payment_date, note, unimputed_remainder) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(settlement.settlement_id)
        .bind(settlement.payer)
        .bind(settlement.receiver)
        .bind(settlement.amount)
        .bind(settlement.payment_date)
        .bind(&settlement.note)
        .bind(settlement.unimputed_remainder)
        .execute(&mut *tx)
        .await?;

        for (position, imputation) in imputations.iter().enumerate() {
            sqlx::query(
                "INSERT INTO settlement_imputations (settlement_id, position, liability_id, amount) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(settlement.settlement_id)
            .bind(position as i32)
            .bind(imputation.liability_id)
            .bind(imputation.amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Imputations of a settlement in allocation order
    pub async fn imputations_for_settlement(
        &self,
        settlement_id: Uuid,
    ) -> Result<Vec<(Uuid, Decimal)>, DatabaseError> {
        let rows = sqlx::query_as::<_, (Uuid, Decimal)>(
            "SELECT liability_id, amount FROM settlement_imputations \
             WHERE settlement_id = $1 ORDER BY position",
        )
        .bind(settlement_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
