//! Money types with exact integer arithmetic
//!
//! Amounts are held as integer minor units (cents) so that long histories can
//! be summed without drift. Decimal values are only accepted and produced at
//! the boundary, using rust_decimal, and every conversion rounds half away
//! from zero exactly once.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Number of decimal places carried by the minor unit
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid divisor: {0} (must be greater than zero)")]
    InvalidDivisor(Decimal),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount stored as signed integer cents
///
/// The ledger is single-currency, so no currency code travels with the value.
/// Ordering compares the signed amount. The checked constructors keep the
/// range symmetric (`±i64::MAX` cents) so negation and `abs` cannot overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    minor: i64,
}

impl Money {
    /// The zero amount
    pub const ZERO: Money = Money { minor: 0 };

    /// Creates Money from an integer amount in minor units (cents)
    pub const fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    /// Creates a zero amount
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Creates Money from a decimal amount, rounding half away from zero to the cent
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the amount does not fit in i64 cents
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?;
        scaled
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::Overflow)
            .and_then(Self::bounded)
    }

    fn bounded(minor: i64) -> Result<Self, MoneyError> {
        if minor == i64::MIN {
            return Err(MoneyError::Overflow);
        }
        Ok(Self::from_minor(minor))
    }

    /// Returns the amount in minor units
    pub fn minor_units(&self) -> i64 {
        self.minor
    }

    /// Returns the amount as a decimal with two decimal places
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor, MINOR_UNIT_SCALE)
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.minor < 0
    }

    /// Returns the absolute value
    ///
    /// `i64::MIN` cents, which only `from_minor` can build, saturates.
    pub fn abs(&self) -> Self {
        Self::from_minor(self.minor.saturating_abs())
    }

    /// Returns this amount's magnitude carrying the sign of `reference`
    ///
    /// A zero reference is treated as positive.
    pub fn with_sign_of(&self, reference: Money) -> Self {
        if reference.is_negative() {
            -self.abs()
        } else {
            self.abs()
        }
    }

    /// Checked addition
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.minor
            .checked_add(other.minor)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::bounded)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.minor
            .checked_sub(other.minor)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::bounded)
    }

    /// Applies a rate and rounds the result once to the cent
    pub fn apply_rate(&self, rate: Rate) -> Result<Money, MoneyError> {
        let product = self
            .to_decimal()
            .checked_mul(rate.as_decimal())
            .ok_or(MoneyError::Overflow)?;
        Self::from_decimal(product)
    }

    /// Splits the amount into `(share, complement)` for the given rate
    ///
    /// Only the share is rounded. The complement is `self - share`, so the two
    /// parts always sum exactly to the original amount.
    pub fn split(&self, rate: Rate) -> Result<(Money, Money), MoneyError> {
        let share = self.apply_rate(rate)?;
        let complement = self.checked_sub(&share)?;
        Ok((share, complement))
    }

    /// Divides by a positive scalar and rounds once to the cent
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidDivisor` for zero or negative divisors
    pub fn divide(&self, divisor: Decimal) -> Result<Money, MoneyError> {
        if divisor <= Decimal::ZERO {
            return Err(MoneyError::InvalidDivisor(divisor));
        }
        let quotient = self
            .to_decimal()
            .checked_div(divisor)
            .ok_or(MoneyError::Overflow)?;
        Self::from_decimal(quotient)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_decimal(amount).map_err(serde::de::Error::custom)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other).expect("Overflow in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other).expect("Overflow in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_minor(self.minor.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// A fractional rate (e.g., a split share or a tax rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.35 for 35%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.35 for 35%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 35 for 35%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Returns true if 0 <= rate <= 1
    pub fn is_fraction(&self) -> bool {
        self.value >= Decimal::ZERO && self.value <= Decimal::ONE
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}
