//! Payables Domain Ports
//!
//! The engine reads source documents and liability records through
//! [`PayablesReadPort`] and persists computed results through
//! [`PayablesWritePort`]. It never caches what it reads: every computation
//! starts from a fresh read.
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PostgresPayablesAdapter`
//! - **In-memory**: [`mock::InMemoryPayablesStore`] (feature `mock`)
//!
//! # Usage
//!
//! ```rust,ignore
//! let store = Arc::new(InMemoryPayablesStore::new());
//! let engine = PayablesEngine::new(config, store.clone(), store);
//! let view = engine.build_vendor_ledger(vendor_id, LedgerFilter::all()).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, InvoiceId, PortError, VendorId};

use crate::entity::EntityPair;
use crate::invoice::VendorInvoice;
use crate::ledger::{DateRange, VendorDocuments};
use crate::liability::CrossEntityLiability;
use crate::settlement::Allocation;

/// Read access to documents and liability records
#[async_trait]
pub trait PayablesReadPort: DomainPort {
    /// Lists every known vendor, ordered by id
    async fn list_vendors(&self) -> Result<Vec<VendorId>, PortError>;

    /// Fetches a vendor's invoices and payments
    ///
    /// Returns the invoices (cancelled ones included) whose document date
    /// falls in `range`, and every payment that references one of them,
    /// whatever its date. Payments of the vendor referencing an unknown
    /// invoice are returned as well.
    ///
    /// # Returns
    ///
    /// `PortError::NotFound` if the vendor is unknown
    async fn fetch_vendor_documents(
        &self,
        vendor_id: VendorId,
        range: DateRange,
    ) -> Result<VendorDocuments, PortError>;

    /// Fetches one invoice, or `PortError::NotFound`
    async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<VendorInvoice, PortError>;

    /// Fetches the liability recorded for an invoice, cancelled or not
    async fn fetch_liability_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Option<CrossEntityLiability>, PortError>;

    /// Fetches all non-cancelled liabilities stored in either direction of the pair
    async fn fetch_liabilities(&self, pair: EntityPair) -> Result<Vec<CrossEntityLiability>, PortError>;
}

/// Write access for computed results
#[async_trait]
pub trait PayablesWritePort: DomainPort {
    /// Inserts or replaces the liability with the same id
    ///
    /// `expected` is the stored record the change was reconciled against, or
    /// `None` if there was none. The write applies only while the stored
    /// record still has the same state; otherwise nothing is written and
    /// `PortError::Conflict` is returned.
    async fn upsert_liability(
        &self,
        liability: &CrossEntityLiability,
        expected: Option<&CrossEntityLiability>,
    ) -> Result<(), PortError>;

    /// Persists a settlement and its liability updates atomically
    ///
    /// Each update applies only if the stored remaining amount still equals
    /// `expected_remaining`. If any check fails nothing is written and
    /// `PortError::Conflict` is returned.
    async fn commit_settlement(&self, allocation: &Allocation) -> Result<(), PortError>;
}

/// In-memory adapter for tests and local runs
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable, LiabilityId};

    use crate::payment::VendorPayment;
    use crate::settlement::SettlementPayment;

    #[derive(Debug, Default)]
    struct StoreState {
        vendors: BTreeMap<VendorId, String>,
        invoices: HashMap<InvoiceId, VendorInvoice>,
        payments: Vec<VendorPayment>,
        liabilities: HashMap<LiabilityId, CrossEntityLiability>,
        settlements: Vec<SettlementPayment>,
    }

    /// Both ports over a single lock, so a settlement commit is atomic
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryPayablesStore {
        state: Arc<RwLock<StoreState>>,
    }

    impl InMemoryPayablesStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn add_vendor(&self, vendor_id: VendorId, name: impl Into<String>) {
            self.state.write().await.vendors.insert(vendor_id, name.into());
        }

        /// Adds an invoice, registering its vendor if needed
        pub async fn add_invoice(&self, invoice: VendorInvoice) {
            let mut state = self.state.write().await;
            state
                .vendors
                .entry(invoice.vendor_id)
                .or_insert_with(|| invoice.vendor_id.to_string());
            state.invoices.insert(invoice.id, invoice);
        }

        pub async fn add_payment(&self, payment: VendorPayment) {
            self.state.write().await.payments.push(payment);
        }

        pub async fn add_liability(&self, liability: CrossEntityLiability) {
            self.state.write().await.liabilities.insert(liability.id, liability);
        }

        /// Marks an invoice cancelled; returns false if unknown
        pub async fn cancel_invoice(&self, invoice_id: InvoiceId) -> bool {
            match self.state.write().await.invoices.get_mut(&invoice_id) {
                Some(invoice) => {
                    invoice.cancel();
                    true
                }
                None => false,
            }
        }

        pub async fn liability(&self, id: LiabilityId) -> Option<CrossEntityLiability> {
            self.state.read().await.liabilities.get(&id).cloned()
        }

        /// Every stored liability, cancelled ones included
        pub async fn liabilities(&self) -> Vec<CrossEntityLiability> {
            self.state.read().await.liabilities.values().cloned().collect()
        }

        pub async fn settlements(&self) -> Vec<SettlementPayment> {
            self.state.read().await.settlements.clone()
        }
    }

    impl DomainPort for InMemoryPayablesStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryPayablesStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-payables".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PayablesReadPort for InMemoryPayablesStore {
        async fn list_vendors(&self) -> Result<Vec<VendorId>, PortError> {
            Ok(self.state.read().await.vendors.keys().copied().collect())
        }

        async fn fetch_vendor_documents(
            &self,
            vendor_id: VendorId,
            range: DateRange,
        ) -> Result<VendorDocuments, PortError> {
            let state = self.state.read().await;
            if !state.vendors.contains_key(&vendor_id) {
                return Err(PortError::not_found("Vendor", vendor_id));
            }

            let mut invoices: Vec<VendorInvoice> = state
                .invoices
                .values()
                .filter(|i| i.vendor_id == vendor_id && range.contains(i.document_date))
                .cloned()
                .collect();
            invoices.sort_by_key(|i| (i.document_date, i.id));

            // Payments on unknown invoices are returned so the ledger can reject them
            let payments = state
                .payments
                .iter()
                .filter(|p| {
                    invoices.iter().any(|i| i.id == p.invoice_id)
                        || (p.vendor_id == vendor_id && !state.invoices.contains_key(&p.invoice_id))
                })
                .cloned()
                .collect();

            Ok(VendorDocuments { invoices, payments })
        }

        async fn fetch_invoice(&self, invoice_id: InvoiceId) -> Result<VendorInvoice, PortError> {
            self.state
                .read()
                .await
                .invoices
                .get(&invoice_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", invoice_id))
        }

        async fn fetch_liability_for_invoice(
            &self,
            invoice_id: InvoiceId,
        ) -> Result<Option<CrossEntityLiability>, PortError> {
            Ok(self
                .state
                .read()
                .await
                .liabilities
                .values()
                .find(|l| l.invoice_id == invoice_id)
                .cloned())
        }

        async fn fetch_liabilities(&self, pair: EntityPair) -> Result<Vec<CrossEntityLiability>, PortError> {
            let state = self.state.read().await;
            let mut liabilities: Vec<CrossEntityLiability> = state
                .liabilities
                .values()
                .filter(|l| !l.cancelled && (l.pair() == pair || l.pair() == pair.reversed()))
                .cloned()
                .collect();
            liabilities.sort_by_key(|l| (l.source_date, l.id));
            Ok(liabilities)
        }
    }

    #[async_trait]
    impl PayablesWritePort for InMemoryPayablesStore {
        async fn upsert_liability(
            &self,
            liability: &CrossEntityLiability,
            expected: Option<&CrossEntityLiability>,
        ) -> Result<(), PortError> {
            let mut state = self.state.write().await;

            let current = state.liabilities.get(&liability.id);
            let unchanged = match (current, expected) {
                (None, None) => true,
                (Some(stored), Some(expected)) => stored.same_state(expected),
                _ => false,
            };
            if !unchanged {
                return Err(PortError::conflict(format!(
                    "Liability {} changed since it was reconciled",
                    liability.id
                )));
            }

            state.liabilities.insert(liability.id, liability.clone());
            Ok(())
        }

        async fn commit_settlement(&self, allocation: &Allocation) -> Result<(), PortError> {
            let mut state = self.state.write().await;

            if state.settlements.iter().any(|s| s.id == allocation.settlement.id) {
                return Err(PortError::validation(format!(
                    "Settlement {} already recorded",
                    allocation.settlement.id
                )));
            }

            for update in &allocation.updates {
                let stored = state
                    .liabilities
                    .get(&update.liability_id)
                    .ok_or_else(|| PortError::not_found("Liability", update.liability_id))?;
                if stored.cancelled || stored.remaining != update.expected_remaining {
                    return Err(PortError::conflict(format!(
                        "Liability {} changed since the snapshot was read",
                        update.liability_id
                    )));
                }
            }

            for update in &allocation.updates {
                if let Some(stored) = state.liabilities.get_mut(&update.liability_id) {
                    stored.remaining = update.new_remaining;
                    stored.settled = update.settled;
                }
            }
            state.settlements.push(allocation.settlement.clone());
            Ok(())
        }
    }
}
