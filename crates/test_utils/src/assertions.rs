//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_payables::{PayablesError, SettlementPayment, VendorLedgerView};
use rust_decimal::Decimal;

/// Asserts that a Money value equals a decimal amount exactly
///
/// # Panics
///
/// Panics if the amounts differ
pub fn assert_money_eq(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.to_decimal(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that imputations plus remainder account for the whole payment
pub fn assert_settlement_conserves_amount(settlement: &SettlementPayment) {
    let imputed = settlement.imputed_total();
    assert_eq!(
        imputed + settlement.unimputed_remainder,
        settlement.amount,
        "Settlement {} not conserved: imputed={}, remainder={}, amount={}",
        settlement.id,
        imputed,
        settlement.unimputed_remainder,
        settlement.amount
    );
    assert!(
        settlement.imputations.iter().all(|i| i.amount.is_positive()),
        "Settlement {} has a non-positive imputation",
        settlement.id
    );
}

/// Asserts that the ledger is ordered and its balances are consistent
pub fn assert_ledger_consistent(view: &VendorLedgerView) {
    for pair in view.entries.windows(2) {
        let (prev, next) = (&pair[0].entry, &pair[1].entry);
        assert!(
            (prev.date, prev.document) <= (next.date, next.document),
            "Ledger out of order: {} on {} before {} on {}",
            prev.document,
            prev.date,
            next.document,
            next.date
        );
    }

    let expected = view.opening_balance + view.total_debit - view.total_credit;
    assert_eq!(
        view.final_balance, expected,
        "Final balance {} does not equal opening + debits - credits = {}",
        view.final_balance, expected
    );

    let per_entity: Money = view.by_entity.values().sum();
    assert_eq!(
        per_entity, view.final_balance,
        "Per-entity balances sum to {}, final balance is {}",
        per_entity, view.final_balance
    );
}

/// Asserts that a result is a data-integrity error naming `document_id`
pub fn assert_data_integrity<T: std::fmt::Debug>(
    result: Result<T, PayablesError>,
    document_id: impl std::fmt::Display,
) {
    match result {
        Err(PayablesError::DataIntegrity { document_id: actual, .. }) => {
            assert_eq!(actual, document_id.to_string(), "Wrong document named");
        }
        other => panic!("Expected data integrity error, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_money_eq() {
        assert_money_eq(Money::from_minor(3_500_000), dec!(35000.00));
    }

    #[test]
    #[should_panic(expected = "Expected zero money")]
    fn test_assert_money_zero_fails() {
        assert_money_zero(Money::from_minor(1));
    }

    #[test]
    fn test_assert_data_integrity() {
        let result: Result<(), PayablesError> = Err(PayablesError::data_integrity("INV-1", "bad"));
        assert_data_integrity(result, "INV-1");
    }
}
