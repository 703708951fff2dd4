//! Payables application service
//!
//! [`PayablesEngine`] wires the pure calculators to the read and write ports.
//! Each call re-reads what it needs; nothing is cached between calls.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use core_kernel::{InvoiceId, Money, PortError, SettlementId, VendorId};

use crate::aggregate::{summarize, BalanceScope, BalanceSummary};
use crate::config::EngineConfig;
use crate::entity::{EntityPair, LegalEntity};
use crate::error::PayablesError;
use crate::invoice::VendorInvoice;
use crate::ledger::{DateRange, LedgerEntryBuilder, LedgerFilter};
use crate::liability::{reconcile, CrossEntityLiability, LiabilityCalculator, LiabilityChange};
use crate::ports::{PayablesReadPort, PayablesWritePort};
use crate::running_balance::VendorLedgerView;
use crate::settlement::{allocate, Allocation, SettlementPayment, SettlementRequest};

/// Liability an invoice would produce, without persisting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiabilityPreview {
    pub invoice: VendorInvoice,
    pub net_amount: Money,
    pub liability: Option<CrossEntityLiability>,
}

/// The inter-company payables engine
pub struct PayablesEngine {
    config: EngineConfig,
    calculator: LiabilityCalculator,
    reader: Arc<dyn PayablesReadPort>,
    writer: Arc<dyn PayablesWritePort>,
}

impl PayablesEngine {
    pub fn new(
        config: EngineConfig,
        reader: Arc<dyn PayablesReadPort>,
        writer: Arc<dyn PayablesWritePort>,
    ) -> Self {
        let calculator = LiabilityCalculator::new(&config);
        Self {
            config,
            calculator,
            reader,
            writer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a vendor's ledger with running balances
    ///
    /// Invoices dated after the filter end are not fetched. Validation runs
    /// over everything fetched, before the entity filter applies.
    #[instrument(skip(self), fields(vendor_id = %vendor_id))]
    pub async fn build_vendor_ledger(
        &self,
        vendor_id: VendorId,
        filter: LedgerFilter,
    ) -> Result<VendorLedgerView, PayablesError> {
        let documents = self
            .reader
            .fetch_vendor_documents(vendor_id, DateRange::until(filter.range.to))
            .await?;
        debug!(
            invoices = documents.invoices.len(),
            payments = documents.payments.len(),
            "Fetched vendor documents"
        );

        let entries = LedgerEntryBuilder::new(vendor_id)
            .build(&documents, filter.entity)
            .inspect_err(|e| warn!(error = %e, "Rejected vendor documents"))?;

        VendorLedgerView::from_entries(vendor_id, filter, entries)
    }

    /// Computes the liability for an invoice; pure
    pub fn compute_cross_entity_liability(
        &self,
        invoice: &VendorInvoice,
    ) -> Result<Option<CrossEntityLiability>, PayablesError> {
        self.calculator.compute(invoice)
    }

    /// Reads an invoice and computes its liability without persisting it
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn preview_invoice_liability(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<LiabilityPreview, PayablesError> {
        let invoice = self.reader.fetch_invoice(invoice_id).await?;
        let net_amount = invoice.net_amount(self.config.vat_divisor())?;
        let liability = self.calculator.compute(&invoice)?;
        Ok(LiabilityPreview {
            invoice,
            net_amount,
            liability,
        })
    }

    /// Recomputes an invoice's liability and persists the difference
    ///
    /// The write is conditional on the stored liability that was reconciled.
    /// If a settlement or another sync changes it first, the invoice and the
    /// liability are re-read and reconciled again, up to the configured
    /// number of attempts.
    ///
    /// # Errors
    ///
    /// `PayablesError::DataIntegrity` if the fresh liability has received
    /// imputations and would have to change; `PayablesError::Port` with a
    /// conflict once the attempts are exhausted.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn sync_invoice_liability(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<LiabilityChange, PayablesError> {
        let attempts = self.config.max_allocation_attempts();

        for attempt in 1..=attempts {
            let invoice = self.reader.fetch_invoice(invoice_id).await?;
            let existing = self.reader.fetch_liability_for_invoice(invoice_id).await?;
            let computed = self.calculator.compute(&invoice)?;

            let change = reconcile(existing.as_ref(), computed)
                .inspect_err(|e| warn!(error = %e, "Refused to change liability"))?;

            let Some(liability) = change.to_persist() else {
                return Ok(change);
            };

            match self.writer.upsert_liability(liability, existing.as_ref()).await {
                Ok(()) => {
                    info!(
                        liability_id = %liability.id,
                        amount = %liability.amount,
                        cancelled = liability.cancelled,
                        "Persisted cross-entity liability"
                    );
                    return Ok(change);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, max_attempts = attempts, error = %e, "Liability changed during sync, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PayablesError::Port(PortError::conflict(format!(
            "liability for invoice {} kept changing after {} attempts",
            invoice_id, attempts
        ))))
    }

    /// Runs the allocator against the current snapshot without persisting
    #[instrument(skip(self, request), fields(pair = %request.pair, amount = %request.amount))]
    pub async fn preview_settlement(
        &self,
        request: &SettlementRequest,
    ) -> Result<Allocation, PayablesError> {
        let snapshot = self.reader.fetch_liabilities(request.pair).await?;
        allocate(request, SettlementId::new_v7(), &snapshot)
    }

    /// Allocates a settlement FIFO and persists it
    ///
    /// A commit rejected for a conflict is retried against a fresh snapshot,
    /// up to the configured number of attempts. The settlement keeps one id
    /// across attempts.
    ///
    /// # Errors
    ///
    /// `PayablesError::AllocationConflict` once the attempts are exhausted.
    #[instrument(skip(self, request), fields(pair = %request.pair, amount = %request.amount))]
    pub async fn allocate_settlement(
        &self,
        request: &SettlementRequest,
    ) -> Result<SettlementPayment, PayablesError> {
        let settlement_id = SettlementId::new_v7();
        let attempts = self.config.max_allocation_attempts();

        for attempt in 1..=attempts {
            let snapshot = self.reader.fetch_liabilities(request.pair).await?;
            debug!(attempt, outstanding = snapshot.len(), "Read outstanding snapshot");

            let allocation = allocate(request, settlement_id, &snapshot)?;

            match self.writer.commit_settlement(&allocation).await {
                Ok(()) => {
                    let settlement = allocation.settlement;
                    info!(
                        settlement_id = %settlement.id,
                        imputations = settlement.imputations.len(),
                        remainder = %settlement.unimputed_remainder,
                        "Committed settlement"
                    );
                    return Ok(settlement);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, max_attempts = attempts, error = %e, "Settlement commit conflicted, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PayablesError::AllocationConflict {
            payer: request.pair.payer(),
            receiver: request.pair.receiver(),
            attempts,
        })
    }

    /// Summarizes balances for the given scope
    #[instrument(skip(self))]
    pub async fn aggregate_balances(&self, scope: BalanceScope) -> Result<BalanceSummary, PayablesError> {
        let pair = EntityPair::paid_by(LegalEntity::A);

        match scope {
            BalanceScope::Vendor { vendor_id, entity } => {
                let filter = LedgerFilter {
                    entity,
                    range: DateRange::unbounded(),
                };
                let view = self.build_vendor_ledger(vendor_id, filter).await?;
                let liabilities: Vec<CrossEntityLiability> = self
                    .reader
                    .fetch_liabilities(pair)
                    .await?
                    .into_iter()
                    .filter(|l| l.vendor_id == vendor_id)
                    .collect();
                summarize(scope, &[view], &liabilities)
            }
            BalanceScope::InterCompany => {
                let liabilities = self.reader.fetch_liabilities(pair).await?;
                summarize(scope, &[], &liabilities)
            }
            BalanceScope::System => {
                let vendors = self.reader.list_vendors().await?;
                let mut views = Vec::with_capacity(vendors.len());
                for vendor_id in vendors {
                    views.push(self.build_vendor_ledger(vendor_id, LedgerFilter::all()).await?);
                }
                let liabilities = self.reader.fetch_liabilities(pair).await?;
                summarize(scope, &views, &liabilities)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SplitTable;
    use crate::ports::mock::InMemoryPayablesStore;
    use chrono::NaiveDate;
    use core_kernel::Rate;
    use rust_decimal_macros::dec;

    fn engine(store: &InMemoryPayablesStore) -> PayablesEngine {
        let split = SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.35))).unwrap();
        let config = EngineConfig::new(split, Some(Rate::new(dec!(0.21)))).unwrap();
        PayablesEngine::new(config, Arc::new(store.clone()), Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_sync_inserts_then_unchanged() {
        let store = InMemoryPayablesStore::new();
        let invoice = VendorInvoice::new(
            VendorId::new(),
            LegalEntity::A,
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            Money::from_minor(12_100_000),
        )
        .as_shared();
        store.add_invoice(invoice.clone()).await;
        let engine = engine(&store);

        let first = engine.sync_invoice_liability(invoice.id).await.unwrap();
        assert!(matches!(first, LiabilityChange::Insert(_)));
        let second = engine.sync_invoice_liability(invoice.id).await.unwrap();
        assert!(matches!(second, LiabilityChange::Unchanged(_)));

        let stored = store
            .liability(CrossEntityLiability::id_for(invoice.id))
            .await
            .unwrap();
        assert_eq!(stored.amount.minor_units(), 3_500_000);
    }

    #[tokio::test]
    async fn test_preview_reports_net_amount() {
        let store = InMemoryPayablesStore::new();
        let invoice = VendorInvoice::new(
            VendorId::new(),
            LegalEntity::B,
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            Money::from_minor(12_100_000),
        );
        store.add_invoice(invoice.clone()).await;

        let preview = engine(&store).preview_invoice_liability(invoice.id).await.unwrap();
        assert_eq!(preview.net_amount.minor_units(), 10_000_000);
        assert!(preview.liability.is_none());
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_not_found() {
        let store = InMemoryPayablesStore::new();
        let err = engine(&store)
            .sync_invoice_liability(InvoiceId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
