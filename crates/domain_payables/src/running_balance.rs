//! Running balance over ledger entries
//!
//! Positive balances are owed to the vendor. Negative balances mean the vendor
//! owes the recording entity (overpayment or an unabsorbed credit note).

use std::collections::BTreeMap;

use serde::Serialize;

use core_kernel::{Money, VendorId};
use crate::entity::LegalEntity;
use crate::error::PayablesError;
use crate::ledger::{EntryDirection, LedgerEntry, LedgerFilter};

/// A ledger entry annotated with the balance after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalancedEntry {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub balance: Money,
}

/// Result of folding a sequence of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningBalance {
    pub entries: Vec<BalancedEntry>,
    pub opening_balance: Money,
    pub total_debit: Money,
    pub total_credit: Money,
    pub final_balance: Money,
}

impl RunningBalance {
    /// Folds entries starting from a zero balance
    pub fn fold(entries: Vec<LedgerEntry>) -> Result<Self, PayablesError> {
        Self::fold_from(Money::ZERO, entries)
    }

    /// Folds entries starting from `opening`
    ///
    /// Entries are taken in the order given. The fold is pure: the same input
    /// always produces the same output.
    pub fn fold_from(opening: Money, entries: Vec<LedgerEntry>) -> Result<Self, PayablesError> {
        let mut balance = opening;
        let mut total_debit = Money::ZERO;
        let mut total_credit = Money::ZERO;
        let mut balanced = Vec::with_capacity(entries.len());

        for entry in entries {
            match entry.direction {
                EntryDirection::Debit => total_debit = total_debit.checked_add(&entry.magnitude)?,
                EntryDirection::Credit => total_credit = total_credit.checked_add(&entry.magnitude)?,
            }
            balance = balance.checked_add(&entry.signed_amount())?;
            balanced.push(BalancedEntry { entry, balance });
        }

        Ok(Self {
            entries: balanced,
            opening_balance: opening,
            total_debit,
            total_credit,
            final_balance: balance,
        })
    }
}

/// Read-only ledger for one vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorLedgerView {
    pub vendor_id: VendorId,
    pub filter: LedgerFilter,
    pub entries: Vec<BalancedEntry>,
    /// Balance carried in from entries dated before the filter start
    pub opening_balance: Money,
    pub total_debit: Money,
    pub total_credit: Money,
    /// `opening_balance + total_debit - total_credit`
    pub final_balance: Money,
    /// Final balance per entity; sums to `final_balance`
    pub by_entity: BTreeMap<LegalEntity, Money>,
}

impl VendorLedgerView {
    /// Builds the view from entries already sorted and entity-filtered
    ///
    /// Entries after the range end are dropped. Entries before the range start
    /// are folded into the opening balance.
    pub fn from_entries(
        vendor_id: VendorId,
        filter: LedgerFilter,
        entries: Vec<LedgerEntry>,
    ) -> Result<Self, PayablesError> {
        let mut opening = Money::ZERO;
        let mut by_entity: BTreeMap<LegalEntity, Money> = BTreeMap::new();
        let mut visible = Vec::with_capacity(entries.len());

        for entry in entries {
            if filter.range.to.is_some_and(|to| entry.date > to) {
                continue;
            }

            let per_entity = by_entity.entry(entry.entity).or_insert(Money::ZERO);
            *per_entity = per_entity.checked_add(&entry.signed_amount())?;

            if filter.range.from.is_some_and(|from| entry.date < from) {
                opening = opening.checked_add(&entry.signed_amount())?;
            } else {
                visible.push(entry);
            }
        }

        let folded = RunningBalance::fold_from(opening, visible)?;

        Ok(Self {
            vendor_id,
            filter,
            entries: folded.entries,
            opening_balance: folded.opening_balance,
            total_debit: folded.total_debit,
            total_credit: folded.total_credit,
            final_balance: folded.final_balance,
            by_entity,
        })
    }

    /// Final balance of one entity, zero if it has no entries
    pub fn entity_balance(&self, entity: LegalEntity) -> Money {
        self.by_entity.get(&entity).copied().unwrap_or(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DateRange, DocumentRef};
    use chrono::NaiveDate;
    use core_kernel::InvoiceId;

    fn entry(day: u32, direction: EntryDirection, cents: i64, entity: LegalEntity) -> LedgerEntry {
        let id = InvoiceId::new();
        LedgerEntry {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            direction,
            magnitude: Money::from_minor(cents),
            document: DocumentRef::Invoice(id),
            invoice_id: id,
            entity,
        }
    }

    #[test]
    fn test_fold_from_zero() {
        let entries = vec![
            entry(1, EntryDirection::Debit, 10_000, LegalEntity::A),
            entry(2, EntryDirection::Credit, 4_000, LegalEntity::A),
            entry(3, EntryDirection::Credit, 7_000, LegalEntity::A),
        ];
        let result = RunningBalance::fold(entries).unwrap();

        let balances: Vec<i64> = result.entries.iter().map(|e| e.balance.minor_units()).collect();
        assert_eq!(balances, vec![10_000, 6_000, -1_000]);
        assert_eq!(result.total_debit.minor_units(), 10_000);
        assert_eq!(result.total_credit.minor_units(), 11_000);
        assert_eq!(result.final_balance.minor_units(), -1_000);
    }

    #[test]
    fn test_fold_empty() {
        let result = RunningBalance::fold(vec![]).unwrap();
        assert!(result.entries.is_empty());
        assert!(result.final_balance.is_zero());
    }

    #[test]
    fn test_view_opening_balance_and_range_end() {
        let entries = vec![
            entry(1, EntryDirection::Debit, 5_000, LegalEntity::A),
            entry(10, EntryDirection::Debit, 3_000, LegalEntity::B),
            entry(20, EntryDirection::Credit, 1_000, LegalEntity::A),
            entry(28, EntryDirection::Debit, 9_999, LegalEntity::A),
        ];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 2, 5),
            NaiveDate::from_ymd_opt(2024, 2, 25),
        )
        .unwrap();
        let filter = LedgerFilter::all().between(range);

        let view = VendorLedgerView::from_entries(VendorId::new(), filter, entries).unwrap();
        assert_eq!(view.opening_balance.minor_units(), 5_000);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].balance.minor_units(), 8_000);
        assert_eq!(view.final_balance.minor_units(), 7_000);
        assert_eq!(view.entity_balance(LegalEntity::A).minor_units(), 4_000);
        assert_eq!(view.entity_balance(LegalEntity::B).minor_units(), 3_000);
    }
}
