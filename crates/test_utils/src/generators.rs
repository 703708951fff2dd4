//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::NaiveDate;
use core_kernel::{InvoiceId, Money, Rate, VendorId};
use domain_payables::{CrossEntityLiability, LegalEntity, SplitTable, VendorInvoice};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating signed amounts in minor units
pub fn amount_minor_strategy() -> impl Strategy<Value = i64> {
    -1_000_000_000i64..1_000_000_000i64
}

/// Strategy for generating positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for generating signed Money values
pub fn money_strategy() -> impl Strategy<Value = Money> {
    amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for generating rates between 0 and 1 in basis points
pub fn rate_strategy() -> impl Strategy<Value = Rate> {
    (0u32..=10_000u32).prop_map(|bps| Rate::new(Decimal::new(bps as i64, 4)))
}

/// Strategy for either legal entity
pub fn entity_strategy() -> impl Strategy<Value = LegalEntity> {
    prop_oneof![Just(LegalEntity::A), Just(LegalEntity::B)]
}

/// Strategy for valid split tables (shares sum exactly to 1)
pub fn split_table_strategy() -> impl Strategy<Value = SplitTable> {
    (0u32..=10_000u32).prop_map(|bps| {
        let share_a = Decimal::new(bps as i64, 4);
        SplitTable::pair(Rate::new(share_a), Rate::new(Decimal::ONE - share_a)).unwrap()
    })
}

/// Strategy for dates within 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1u32..=12u32, 1u32..=28u32).prop_map(|(m, d)| NaiveDate::from_ymd_opt(2024, m, d).unwrap())
}

/// Strategy for shared invoices and credit notes of one vendor
pub fn shared_invoice_strategy(vendor_id: VendorId) -> impl Strategy<Value = VendorInvoice> {
    (entity_strategy(), date_strategy(), money_strategy(), any::<bool>()).prop_map(
        move |(entity, date, gross, with_net)| {
            let invoice = VendorInvoice::new(vendor_id, entity, date, gross).as_shared();
            if with_net {
                invoice.with_net(Money::from_minor(gross.minor_units().abs() * 100 / 121))
            } else {
                invoice
            }
        },
    )
}

/// Strategy for outstanding liabilities owed by `payer`
pub fn outstanding_liability_strategy(payer: LegalEntity) -> impl Strategy<Value = CrossEntityLiability> {
    (date_strategy(), positive_amount_minor_strategy()).prop_map(move |(date, cents)| {
        let invoice_id = InvoiceId::new();
        let amount = Money::from_minor(cents);
        CrossEntityLiability {
            id: CrossEntityLiability::id_for(invoice_id),
            invoice_id,
            vendor_id: VendorId::new(),
            payer,
            receiver: payer.complement(),
            amount,
            remaining: amount,
            source_date: date,
            settled: false,
            cancelled: false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_split_tables_sum_to_one(table in split_table_strategy()) {
            let total = table.share(LegalEntity::A).as_decimal() + table.share(LegalEntity::B).as_decimal();
            prop_assert_eq!(total, Decimal::ONE);
        }

        #[test]
        fn generated_liabilities_are_outstanding(l in outstanding_liability_strategy(LegalEntity::B)) {
            prop_assert!(l.is_outstanding());
            prop_assert_eq!(l.effective_payer(), LegalEntity::B);
        }
    }
}
