//! Cross-entity liabilities
//!
//! When an entity records a shared invoice it pays the vendor in full, and the
//! other entity owes it the contractual share of the tax-exclusive amount.
//!
//! | Invoice entity | Payer | Receiver | Amount            |
//! |----------------|-------|----------|-------------------|
//! | A              | B     | A        | net x share(B)    |
//! | B              | A     | B        | net x share(A)    |
//!
//! A credit note runs through the same rule with its own negative sign, so
//! its liability is negative and nets against the original.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, LiabilityId, Money, VendorId};
use crate::config::EngineConfig;
use crate::entity::{EntityPair, LegalEntity, SplitTable};
use crate::error::PayablesError;
use crate::invoice::VendorInvoice;

const LIABILITY_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_3a52_9d0e_4b7a_8e21_f4c9_0b3d_5a17);

/// Amount one entity owes the other for a shared invoice
///
/// `payer` and `receiver` are the roles the split rule assigns from the
/// invoice's entity, whatever the sign. For a credit note the amount is
/// negative and the debt runs the other way: [`effective_payer`] is the
/// entity that actually owes, and settlements match on it.
///
/// [`effective_payer`]: CrossEntityLiability::effective_payer
///
/// # Invariants
///
/// - `payer != receiver`
/// - `amount` has the sign of the source invoice's gross amount
/// - `remaining` has the sign of `amount` and moves toward zero only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEntityLiability {
    pub id: LiabilityId,
    pub invoice_id: InvoiceId,
    pub vendor_id: VendorId,
    pub payer: LegalEntity,
    pub receiver: LegalEntity,
    pub amount: Money,
    pub remaining: Money,
    /// Document date of the source invoice
    pub source_date: NaiveDate,
    pub settled: bool,
    pub cancelled: bool,
}

impl CrossEntityLiability {
    /// Deterministic liability id for an invoice
    pub fn id_for(invoice_id: InvoiceId) -> LiabilityId {
        LiabilityId::from_uuid(Uuid::new_v5(&LIABILITY_NAMESPACE, invoice_id.as_uuid().as_bytes()))
    }

    /// The pair as stored
    pub fn pair(&self) -> EntityPair {
        EntityPair::paid_by(self.payer)
    }

    /// Entity that actually owes money; the receiver for a negative liability
    pub fn effective_payer(&self) -> LegalEntity {
        if self.amount.is_negative() {
            self.receiver
        } else {
            self.payer
        }
    }

    pub fn effective_receiver(&self) -> LegalEntity {
        self.effective_payer().complement()
    }

    pub fn effective_pair(&self) -> EntityPair {
        EntityPair::paid_by(self.effective_payer())
    }

    /// Unsigned amount still to be settled
    pub fn outstanding_magnitude(&self) -> Money {
        self.remaining.abs()
    }

    pub fn is_outstanding(&self) -> bool {
        !self.cancelled && !self.settled && !self.remaining.is_zero()
    }

    /// True once any settlement has been imputed
    pub fn has_imputations(&self) -> bool {
        self.remaining != self.amount
    }

    /// True if both records carry the same amounts, direction and flags
    pub fn same_state(&self, other: &CrossEntityLiability) -> bool {
        self.id == other.id
            && self.payer == other.payer
            && self.receiver == other.receiver
            && self.amount == other.amount
            && self.remaining == other.remaining
            && self.settled == other.settled
            && self.cancelled == other.cancelled
    }

    fn same_terms(&self, other: &CrossEntityLiability) -> bool {
        self.invoice_id == other.invoice_id
            && self.vendor_id == other.vendor_id
            && self.payer == other.payer
            && self.receiver == other.receiver
            && self.amount == other.amount
            && self.source_date == other.source_date
    }
}

/// Computes liabilities from invoices
#[derive(Debug, Clone)]
pub struct LiabilityCalculator {
    split: SplitTable,
    vat_divisor: Decimal,
}

impl LiabilityCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            split: *config.split(),
            vat_divisor: config.vat_divisor(),
        }
    }

    /// Computes the liability an invoice gives rise to
    ///
    /// Returns `None` for invoices that are not shared or are cancelled. The
    /// result is a pure function of the invoice and the configuration.
    ///
    /// The amount is `|net| x share`, rounded once, where the net is the
    /// recorded one or `|gross| / (1 + vat)` rounded to the cent. The
    /// liability always agrees with [`VendorInvoice::net_amount`].
    ///
    /// # Errors
    ///
    /// `PayablesError::DataIntegrity` naming the invoice when the net amount
    /// cannot be derived.
    pub fn compute(&self, invoice: &VendorInvoice) -> Result<Option<CrossEntityLiability>, PayablesError> {
        if !invoice.shared || invoice.is_cancelled() {
            return Ok(None);
        }

        let payer = invoice.entity.complement();
        let share = self.split.share(payer);

        let net = invoice.net_amount(self.vat_divisor)?;
        let magnitude = net.abs().apply_rate(share)?;
        let amount = magnitude.with_sign_of(invoice.gross_amount);

        Ok(Some(CrossEntityLiability {
            id: CrossEntityLiability::id_for(invoice.id),
            invoice_id: invoice.id,
            vendor_id: invoice.vendor_id,
            payer,
            receiver: invoice.entity,
            amount,
            remaining: amount,
            source_date: invoice.document_date,
            settled: amount.is_zero(),
            cancelled: false,
        }))
    }
}

/// What persisting a freshly computed liability amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiabilityChange {
    /// No liability exists and none is needed
    Noop,
    Insert(CrossEntityLiability),
    Unchanged(CrossEntityLiability),
    Replace {
        previous: CrossEntityLiability,
        next: CrossEntityLiability,
    },
    /// The stored liability, marked cancelled
    Cancel(CrossEntityLiability),
}

impl LiabilityChange {
    /// The record to upsert, if any
    pub fn to_persist(&self) -> Option<&CrossEntityLiability> {
        match self {
            LiabilityChange::Insert(l) | LiabilityChange::Cancel(l) => Some(l),
            LiabilityChange::Replace { next, .. } => Some(next),
            LiabilityChange::Noop | LiabilityChange::Unchanged(_) => None,
        }
    }

    /// The liability in force after the change
    pub fn current(&self) -> Option<&CrossEntityLiability> {
        match self {
            LiabilityChange::Insert(l) | LiabilityChange::Unchanged(l) => Some(l),
            LiabilityChange::Replace { next, .. } => Some(next),
            LiabilityChange::Noop | LiabilityChange::Cancel(_) => None,
        }
    }
}

/// Decides how a stored liability must change to match a computed one
///
/// # Errors
///
/// `PayablesError::DataIntegrity` when the stored liability already received
/// imputations and would have to be altered or cancelled.
pub fn reconcile(
    existing: Option<&CrossEntityLiability>,
    computed: Option<CrossEntityLiability>,
) -> Result<LiabilityChange, PayablesError> {
    match (existing, computed) {
        (None, None) => Ok(LiabilityChange::Noop),
        (None, Some(next)) => Ok(LiabilityChange::Insert(next)),
        (Some(stored), None) => {
            if stored.cancelled {
                return Ok(LiabilityChange::Noop);
            }
            if stored.has_imputations() {
                return Err(PayablesError::data_integrity(
                    stored.invoice_id,
                    format!("liability {} already has imputations and cannot be cancelled", stored.id),
                ));
            }
            let mut cancelled = stored.clone();
            cancelled.cancelled = true;
            Ok(LiabilityChange::Cancel(cancelled))
        }
        (Some(stored), Some(next)) => {
            if !stored.cancelled && stored.same_terms(&next) {
                return Ok(LiabilityChange::Unchanged(stored.clone()));
            }
            if !stored.cancelled && stored.has_imputations() {
                return Err(PayablesError::data_integrity(
                    stored.invoice_id,
                    format!("liability {} already has imputations and cannot be altered", stored.id),
                ));
            }
            Ok(LiabilityChange::Replace {
                previous: stored.clone(),
                next,
            })
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::Rate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    proptest! {
        #[test]
        fn liability_sign_matches_invoice_sign(
            cents in -100_000_000_000i64..100_000_000_000i64,
            entity_a in any::<bool>(),
            with_net in any::<bool>()
        ) {
            let split = SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.35))).unwrap();
            let config = EngineConfig::new(split, Some(Rate::new(dec!(0.21)))).unwrap();
            let calculator = LiabilityCalculator::new(&config);

            let entity = if entity_a { LegalEntity::A } else { LegalEntity::B };
            let gross = Money::from_minor(cents);
            let mut inv = VendorInvoice::new(
                VendorId::new(),
                entity,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                gross,
            )
            .as_shared();
            if with_net {
                inv = inv.with_net(gross.abs().divide(dec!(1.21)).unwrap());
            }

            let liability = calculator.compute(&inv).unwrap().unwrap();
            let net = inv.net_amount(config.vat_divisor()).unwrap();
            prop_assert_eq!(
                liability.amount.abs(),
                net.abs().apply_rate(config.split().share(liability.payer)).unwrap()
            );
            prop_assert!(!(liability.amount.is_positive() && gross.is_negative()));
            prop_assert!(!(liability.amount.is_negative() && gross.is_positive()));
            prop_assert_ne!(liability.payer, liability.receiver);
            prop_assert_eq!(calculator.compute(&inv).unwrap().unwrap(), liability);
        }
    }
}
