//! FIFO settlement allocation
//!
//! A lump-sum inter-company payment is imputed to the payer's outstanding
//! liabilities oldest first. Allocation is a pure function of the request and
//! the outstanding snapshot; persisting the result is the caller's job and
//! must happen atomically with a compare-and-swap on each touched liability.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, LiabilityId, Money, SettlementId};
use crate::entity::{EntityPair, LegalEntity};
use crate::error::PayablesError;
use crate::liability::CrossEntityLiability;

/// A settlement to allocate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequest {
    pub pair: EntityPair,
    /// Strictly positive
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
}

impl SettlementRequest {
    pub fn new(pair: EntityPair, amount: Money, payment_date: NaiveDate) -> Result<Self, PayablesError> {
        if !amount.is_positive() {
            return Err(PayablesError::validation(format!(
                "Settlement amount must be positive, got {}",
                amount
            )));
        }
        Ok(Self {
            pair,
            amount,
            payment_date,
            note: None,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Part of a settlement applied to one liability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imputation {
    pub liability_id: LiabilityId,
    pub invoice_id: InvoiceId,
    /// Always positive
    pub amount: Money,
}

/// Compare-and-swap update of one liability's remaining amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiabilityUpdate {
    pub liability_id: LiabilityId,
    /// Remaining amount in the snapshot the allocation was computed from
    pub expected_remaining: Money,
    pub new_remaining: Money,
    pub settled: bool,
}

/// A lump-sum inter-company payment with its imputations
///
/// # Invariants
///
/// - `receiver == payer.complement()`
/// - `sum(imputations) + unimputed_remainder == amount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPayment {
    pub id: SettlementId,
    pub payer: LegalEntity,
    pub receiver: LegalEntity,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    /// In allocation order
    pub imputations: Vec<Imputation>,
    pub unimputed_remainder: Money,
}

impl SettlementPayment {
    pub fn imputed_total(&self) -> Money {
        self.imputations.iter().map(|i| i.amount).sum()
    }
}

/// A proposed allocation, ready to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub settlement: SettlementPayment,
    pub updates: Vec<LiabilityUpdate>,
}

/// Allocates a settlement across outstanding liabilities, oldest first
///
/// Only liabilities that are outstanding and whose effective payer and
/// receiver match the request take part. They are ordered by source date,
/// ties broken by liability id. Each step imputes the smaller of the payment
/// left and the liability's outstanding magnitude. Whatever is left over is
/// returned as `unimputed_remainder`.
///
/// # Errors
///
/// `PayablesError::DataIntegrity` if the snapshot holds the same liability
/// twice.
pub fn allocate(
    request: &SettlementRequest,
    settlement_id: SettlementId,
    outstanding: &[CrossEntityLiability],
) -> Result<Allocation, PayablesError> {
    let mut seen = HashSet::with_capacity(outstanding.len());
    for liability in outstanding {
        if !seen.insert(liability.id) {
            return Err(PayablesError::data_integrity(
                liability.id,
                "liability appears twice in the outstanding snapshot",
            ));
        }
    }

    let mut candidates: Vec<&CrossEntityLiability> = outstanding
        .iter()
        .filter(|l| l.is_outstanding() && l.effective_pair() == request.pair)
        .collect();
    candidates.sort_by_key(|l| (l.source_date, l.id));

    let mut left = request.amount;
    let mut imputations = Vec::new();
    let mut updates = Vec::new();

    for liability in candidates {
        if left.is_zero() {
            break;
        }
        let open = liability.outstanding_magnitude();
        let take = left.min(open);
        let new_remaining = open.checked_sub(&take)?.with_sign_of(liability.amount);

        imputations.push(Imputation {
            liability_id: liability.id,
            invoice_id: liability.invoice_id,
            amount: take,
        });
        updates.push(LiabilityUpdate {
            liability_id: liability.id,
            expected_remaining: liability.remaining,
            new_remaining,
            settled: new_remaining.is_zero(),
        });
        left = left.checked_sub(&take)?;
    }

    Ok(Allocation {
        settlement: SettlementPayment {
            id: settlement_id,
            payer: request.pair.payer(),
            receiver: request.pair.receiver(),
            amount: request.amount,
            payment_date: request.payment_date,
            note: request.note.clone(),
            imputations,
            unimputed_remainder: left,
        },
        updates,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::VendorId;
    use proptest::prelude::*;

    fn arb_liability() -> impl Strategy<Value = CrossEntityLiability> {
        (1u32..5u32, 1i64..5_000_000i64, any::<bool>()).prop_map(|(day, cents, b_pays)| {
            let invoice_id = InvoiceId::new();
            let payer = if b_pays { LegalEntity::B } else { LegalEntity::A };
            CrossEntityLiability {
                id: CrossEntityLiability::id_for(invoice_id),
                invoice_id,
                vendor_id: VendorId::new(),
                payer,
                receiver: payer.complement(),
                amount: Money::from_minor(cents),
                remaining: Money::from_minor(cents),
                source_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                settled: false,
                cancelled: false,
            }
        })
    }

    proptest! {
        #[test]
        fn imputed_plus_remainder_equals_amount(
            snapshot in prop::collection::vec(arb_liability(), 0..20),
            cents in 1i64..50_000_000i64
        ) {
            let req = SettlementRequest::new(
                EntityPair::paid_by(LegalEntity::B),
                Money::from_minor(cents),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ).unwrap();
            let allocation = allocate(&req, SettlementId::new(), &snapshot).unwrap();
            let s = allocation.settlement;
            prop_assert_eq!(s.imputed_total() + s.unimputed_remainder, s.amount);
            prop_assert!(!s.unimputed_remainder.is_negative());
        }

        #[test]
        fn allocation_is_idempotent_and_order_independent(
            snapshot in prop::collection::vec(arb_liability(), 0..20),
            cents in 1i64..50_000_000i64
        ) {
            let req = SettlementRequest::new(
                EntityPair::paid_by(LegalEntity::A),
                Money::from_minor(cents),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ).unwrap();
            let id = SettlementId::new();
            let first = allocate(&req, id, &snapshot).unwrap();
            let again = allocate(&req, id, &snapshot).unwrap();
            prop_assert_eq!(&first, &again);

            let mut reversed = snapshot.clone();
            reversed.reverse();
            let shuffled = allocate(&req, id, &reversed).unwrap();
            prop_assert_eq!(first, shuffled);
        }
    }
}
