//! Balance aggregation
//!
//! Pure reductions over vendor ledger views and liability records. Gross
//! invoiced totals are summed from the documents directly; they are never
//! reconstructed from split amounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use core_kernel::{Money, VendorId};
use crate::entity::LegalEntity;
use crate::error::PayablesError;
use crate::ledger::DocumentRef;
use crate::liability::CrossEntityLiability;
use crate::running_balance::VendorLedgerView;

/// What a balance summary covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum BalanceScope {
    /// One vendor, optionally one entity's books
    Vendor {
        vendor_id: VendorId,
        entity: Option<LegalEntity>,
    },
    /// Only the inter-company position
    InterCompany,
    /// Every vendor plus the inter-company position
    System,
}

/// Outstanding balance owed to one vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorBalance {
    pub vendor_id: VendorId,
    pub outstanding: Money,
    pub by_entity: BTreeMap<LegalEntity, Money>,
    /// Signed sum of gross amounts of active invoices and credit notes
    pub gross_invoiced: Money,
}

impl VendorBalance {
    pub fn from_view(view: &VendorLedgerView) -> Result<Self, PayablesError> {
        let mut gross_invoiced = Money::ZERO;
        for balanced in &view.entries {
            if let DocumentRef::Invoice(_) = balanced.entry.document {
                gross_invoiced = gross_invoiced.checked_add(&balanced.entry.signed_amount())?;
            }
        }

        Ok(Self {
            vendor_id: view.vendor_id,
            outstanding: view.final_balance,
            by_entity: view.by_entity.clone(),
            gross_invoiced,
        })
    }
}

/// Net inter-company position
///
/// `net = owed_by_a - owed_by_b`; positive means A owes B.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InterCompanyPosition {
    /// Signed remaining of liabilities stored with A as payer
    pub owed_by_a: Money,
    pub owed_by_b: Money,
    pub net: Money,
    pub outstanding_count: usize,
}

impl InterCompanyPosition {
    /// Reduces liability records, skipping cancelled ones
    pub fn from_liabilities(liabilities: &[CrossEntityLiability]) -> Result<Self, PayablesError> {
        let mut owed_by_a = Money::ZERO;
        let mut owed_by_b = Money::ZERO;
        let mut outstanding_count = 0;

        for liability in liabilities.iter().filter(|l| !l.cancelled) {
            match liability.payer {
                LegalEntity::A => owed_by_a = owed_by_a.checked_add(&liability.remaining)?,
                LegalEntity::B => owed_by_b = owed_by_b.checked_add(&liability.remaining)?,
            }
            if liability.is_outstanding() {
                outstanding_count += 1;
            }
        }

        Ok(Self {
            owed_by_a,
            owed_by_b,
            net: owed_by_a.checked_sub(&owed_by_b)?,
            outstanding_count,
        })
    }
}

/// Dashboard-level totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemTotals {
    pub vendor_count: usize,
    pub vendor_outstanding: Money,
    pub vendor_outstanding_by_entity: BTreeMap<LegalEntity, Money>,
    pub gross_invoiced: Money,
    pub inter_company_net: Money,
    pub outstanding_liabilities: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub scope: BalanceScope,
    pub vendors: Vec<VendorBalance>,
    pub inter_company: InterCompanyPosition,
    pub totals: SystemTotals,
}

/// Summarizes the given views and liabilities
///
/// The caller decides what goes in for the scope: no views for
/// `InterCompany`, one view and that vendor's liabilities for `Vendor`.
pub fn summarize(
    scope: BalanceScope,
    views: &[VendorLedgerView],
    liabilities: &[CrossEntityLiability],
) -> Result<BalanceSummary, PayablesError> {
    let vendors = views
        .iter()
        .map(VendorBalance::from_view)
        .collect::<Result<Vec<_>, _>>()?;
    let inter_company = InterCompanyPosition::from_liabilities(liabilities)?;

    let mut vendor_outstanding = Money::ZERO;
    let mut gross_invoiced = Money::ZERO;
    let mut by_entity: BTreeMap<LegalEntity, Money> = BTreeMap::new();
    for vendor in &vendors {
        vendor_outstanding = vendor_outstanding.checked_add(&vendor.outstanding)?;
        gross_invoiced = gross_invoiced.checked_add(&vendor.gross_invoiced)?;
        for (entity, amount) in &vendor.by_entity {
            let slot = by_entity.entry(*entity).or_insert(Money::ZERO);
            *slot = slot.checked_add(amount)?;
        }
    }

    let totals = SystemTotals {
        vendor_count: vendors.len(),
        vendor_outstanding,
        vendor_outstanding_by_entity: by_entity,
        gross_invoiced,
        inter_company_net: inter_company.net,
        outstanding_liabilities: inter_company.outstanding_count,
    };

    Ok(BalanceSummary {
        scope,
        vendors,
        inter_company,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{EntryDirection, LedgerEntry, LedgerFilter};
    use chrono::NaiveDate;
    use core_kernel::{InvoiceId, PaymentId};

    fn liability(payer: LegalEntity, remaining: i64) -> CrossEntityLiability {
        let invoice_id = InvoiceId::new();
        CrossEntityLiability {
            id: CrossEntityLiability::id_for(invoice_id),
            invoice_id,
            vendor_id: VendorId::new(),
            payer,
            receiver: payer.complement(),
            amount: Money::from_minor(remaining),
            remaining: Money::from_minor(remaining),
            source_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            settled: remaining == 0,
            cancelled: false,
        }
    }

    #[test]
    fn test_invoice_and_credit_note_net_to_zero() {
        let position = InterCompanyPosition::from_liabilities(&[
            liability(LegalEntity::B, 3_500_000),
            liability(LegalEntity::B, -3_500_000),
        ])
        .unwrap();
        assert!(position.owed_by_b.is_zero());
        assert!(position.net.is_zero());
        assert_eq!(position.outstanding_count, 2);
    }

    #[test]
    fn test_net_positive_means_a_owes_b() {
        let mut cancelled = liability(LegalEntity::B, 999);
        cancelled.cancelled = true;
        let position = InterCompanyPosition::from_liabilities(&[
            liability(LegalEntity::A, 6_500),
            liability(LegalEntity::B, 3_500),
            cancelled,
        ])
        .unwrap();
        assert_eq!(position.net.minor_units(), 3_000);
        assert_eq!(position.outstanding_count, 2);
    }

    #[test]
    fn test_summarize_totals() {
        let vendor = VendorId::new();
        let invoice_id = InvoiceId::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = vec![
            LedgerEntry {
                date,
                direction: EntryDirection::Debit,
                magnitude: Money::from_minor(12_100),
                document: DocumentRef::Invoice(invoice_id),
                invoice_id,
                entity: LegalEntity::A,
            },
            LedgerEntry {
                date,
                direction: EntryDirection::Credit,
                magnitude: Money::from_minor(2_100),
                document: DocumentRef::Payment(PaymentId::new()),
                invoice_id,
                entity: LegalEntity::A,
            },
        ];
        let view = VendorLedgerView::from_entries(vendor, LedgerFilter::all(), entries).unwrap();

        let summary = summarize(
            BalanceScope::System,
            &[view],
            &[liability(LegalEntity::B, 3_500)],
        )
        .unwrap();

        assert_eq!(summary.vendors[0].outstanding.minor_units(), 10_000);
        assert_eq!(summary.vendors[0].gross_invoiced.minor_units(), 12_100);
        assert_eq!(summary.totals.vendor_outstanding.minor_units(), 10_000);
        assert_eq!(summary.totals.vendor_outstanding_by_entity[&LegalEntity::A].minor_units(), 10_000);
        assert_eq!(summary.totals.inter_company_net.minor_units(), -3_500);
        assert_eq!(summary.totals.outstanding_liabilities, 1);
    }
}
