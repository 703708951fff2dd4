//! Legal entities and the contractual split table
//!
//! The two related companies are modelled as a closed enum. The share each
//! entity bears of a shared invoice comes from configuration and is validated
//! once, at construction, to sum exactly to one.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Rate;
use crate::error::PayablesError;

/// One of the two legal entities that record vendor invoices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LegalEntity {
    A,
    B,
}

impl LegalEntity {
    /// Both entities, in canonical order
    pub const ALL: [LegalEntity; 2] = [LegalEntity::A, LegalEntity::B];

    /// Returns the other entity of the pair
    pub fn complement(self) -> Self {
        match self {
            LegalEntity::A => LegalEntity::B,
            LegalEntity::B => LegalEntity::A,
        }
    }

    /// Returns the short code used in storage and URLs
    pub fn code(self) -> &'static str {
        match self {
            LegalEntity::A => "A",
            LegalEntity::B => "B",
        }
    }

    fn index(self) -> usize {
        match self {
            LegalEntity::A => 0,
            LegalEntity::B => 1,
        }
    }
}

impl fmt::Display for LegalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LegalEntity {
    type Err = PayablesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(LegalEntity::A),
            "B" | "b" => Ok(LegalEntity::B),
            other => Err(PayablesError::validation(format!("Unknown legal entity: {}", other))),
        }
    }
}

/// An ordered (payer, receiver) pair of distinct entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityPair {
    payer: LegalEntity,
    receiver: LegalEntity,
}

impl EntityPair {
    /// Creates a pair, rejecting a payer equal to the receiver
    pub fn new(payer: LegalEntity, receiver: LegalEntity) -> Result<Self, PayablesError> {
        if payer == receiver {
            return Err(PayablesError::validation(format!(
                "Payer and receiver must differ, both are {}",
                payer
            )));
        }
        Ok(Self { payer, receiver })
    }

    /// Creates the pair where `payer` pays its complement
    pub fn paid_by(payer: LegalEntity) -> Self {
        Self {
            payer,
            receiver: payer.complement(),
        }
    }

    pub fn payer(&self) -> LegalEntity {
        self.payer
    }

    pub fn receiver(&self) -> LegalEntity {
        self.receiver
    }

    /// Returns the pair with roles swapped
    pub fn reversed(&self) -> Self {
        Self {
            payer: self.receiver,
            receiver: self.payer,
        }
    }
}

impl fmt::Display for EntityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.payer, self.receiver)
    }
}

/// Share of a shared invoice borne by each entity
///
/// # Invariants
///
/// - Every entity has a share in [0, 1]
/// - Shares sum to exactly 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitTable {
    shares: [Rate; 2],
}

impl SplitTable {
    /// Builds a split table from (entity, share) pairs
    ///
    /// # Errors
    ///
    /// Returns `PayablesError::Configuration` when an entity is missing or
    /// repeated, a share lies outside [0, 1], or the shares do not sum to 1.
    /// Shares are never normalized.
    pub fn new(shares: impl IntoIterator<Item = (LegalEntity, Rate)>) -> Result<Self, PayablesError> {
        let mut table: [Option<Rate>; 2] = [None, None];

        for (entity, share) in shares {
            if table[entity.index()].is_some() {
                return Err(PayablesError::configuration(format!(
                    "Share for entity {} given more than once",
                    entity
                )));
            }
            if !share.is_fraction() {
                return Err(PayablesError::configuration(format!(
                    "Share for entity {} must lie in [0, 1], got {}",
                    entity,
                    share.as_decimal()
                )));
            }
            table[entity.index()] = Some(share);
        }

        let mut resolved = [Rate::new(Decimal::ZERO); 2];
        for entity in LegalEntity::ALL {
            resolved[entity.index()] = table[entity.index()].ok_or_else(|| {
                PayablesError::configuration(format!("Missing share for entity {}", entity))
            })?;
        }

        let total: Decimal = resolved.iter().map(Rate::as_decimal).sum();
        if total != Decimal::ONE {
            return Err(PayablesError::configuration(format!(
                "Split shares must sum to 1, got {}",
                total
            )));
        }

        Ok(Self { shares: resolved })
    }

    /// Convenience constructor for the two-entity universe
    pub fn pair(share_a: Rate, share_b: Rate) -> Result<Self, PayablesError> {
        Self::new([(LegalEntity::A, share_a), (LegalEntity::B, share_b)])
    }

    /// Returns the share borne by `entity`
    pub fn share(&self, entity: LegalEntity) -> Rate {
        self.shares[entity.index()]
    }

    /// Iterates over (entity, share)
    pub fn iter(&self) -> impl Iterator<Item = (LegalEntity, Rate)> + '_ {
        LegalEntity::ALL.into_iter().map(|e| (e, self.share(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_complement() {
        assert_eq!(LegalEntity::A.complement(), LegalEntity::B);
        assert_eq!(LegalEntity::B.complement(), LegalEntity::A);
    }

    #[test]
    fn test_parse_entity() {
        assert_eq!("a".parse::<LegalEntity>().unwrap(), LegalEntity::A);
        assert_eq!(" B ".parse::<LegalEntity>().unwrap(), LegalEntity::B);
        assert!("C".parse::<LegalEntity>().is_err());
    }

    #[test]
    fn test_pair_rejects_same_entity() {
        assert!(EntityPair::new(LegalEntity::A, LegalEntity::A).is_err());
        let pair = EntityPair::new(LegalEntity::B, LegalEntity::A).unwrap();
        assert_eq!(pair, EntityPair::paid_by(LegalEntity::B));
        assert_eq!(pair.reversed().payer(), LegalEntity::A);
        assert_eq!(pair.to_string(), "B->A");
    }

    #[test]
    fn test_split_table_accepts_exact_sum() {
        let table = SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.35))).unwrap();
        assert_eq!(table.share(LegalEntity::A).as_decimal(), dec!(0.65));
        assert_eq!(table.share(LegalEntity::B).as_decimal(), dec!(0.35));
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn test_split_table_rejects_bad_sum() {
        let result = SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.34)));
        assert!(matches!(result, Err(PayablesError::Configuration(_))));
    }

    #[test]
    fn test_split_table_rejects_missing_or_duplicate_entity() {
        let missing = SplitTable::new([(LegalEntity::A, Rate::new(Decimal::ONE))]);
        assert!(matches!(missing, Err(PayablesError::Configuration(_))));

        let duplicate = SplitTable::new([
            (LegalEntity::A, Rate::new(dec!(0.5))),
            (LegalEntity::A, Rate::new(dec!(0.5))),
        ]);
        assert!(matches!(duplicate, Err(PayablesError::Configuration(_))));
    }

    #[test]
    fn test_split_table_rejects_share_out_of_range() {
        let result = SplitTable::pair(Rate::new(dec!(1.2)), Rate::new(dec!(-0.2)));
        assert!(matches!(result, Err(PayablesError::Configuration(_))));
    }
}
