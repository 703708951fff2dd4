//! Pre-built Test Fixtures
//!
//! Provides ready-to-use documents, liabilities and configuration. The
//! scenario fixtures reproduce the reference cases the engine is checked
//! against: a shared invoice, its full credit note, and two B-to-A
//! liabilities of 10,000 and 8,000.

use chrono::NaiveDate;
use core_kernel::{InvoiceId, Money, Rate, VendorId};
use domain_payables::{
    CrossEntityLiability, EngineConfig, LegalEntity, SplitTable, VendorInvoice,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates Money from a decimal literal
    pub fn amount(value: Decimal) -> Money {
        Money::from_decimal(value).unwrap()
    }

    /// Gross amount of the reference invoice
    pub fn gross_121k() -> Money {
        Self::amount(dec!(121000))
    }

    /// Net amount of the reference invoice
    pub fn net_100k() -> Money {
        Self::amount(dec!(100000))
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// A day in January 2024
    pub fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// A day in February 2024
    pub fn feb(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    /// Settlement date used by the scenarios
    pub fn settlement_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic vendor ID for testing
    pub fn vendor_id() -> VendorId {
        VendorId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440101").unwrap())
    }

    /// Creates a deterministic invoice ID for testing
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440102").unwrap())
    }
}

/// Fixture for engine configuration
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// The contractual 65/35 split
    pub fn split_65_35() -> SplitTable {
        SplitTable::pair(Rate::new(dec!(0.65)), Rate::new(dec!(0.35))).unwrap()
    }

    /// 21% VAT
    pub fn vat_21() -> Rate {
        Rate::new(dec!(0.21))
    }

    /// Standard engine configuration
    pub fn engine_config() -> EngineConfig {
        EngineConfig::new(Self::split_65_35(), Some(Self::vat_21())).unwrap()
    }
}

/// Fixture for the reference scenarios
pub struct ScenarioFixtures;

impl ScenarioFixtures {
    /// Entity A records a shared invoice of 121,000 gross, 100,000 net
    pub fn shared_invoice() -> VendorInvoice {
        VendorInvoice::new(
            IdFixtures::vendor_id(),
            LegalEntity::A,
            DateFixtures::jan(10),
            MoneyFixtures::gross_121k(),
        )
        .with_id(IdFixtures::invoice_id())
        .with_net(MoneyFixtures::net_100k())
        .with_reference("FC-A-0001")
        .as_shared()
    }

    /// Full credit note against [`Self::shared_invoice`]
    pub fn full_credit_note() -> VendorInvoice {
        VendorInvoice::new(
            IdFixtures::vendor_id(),
            LegalEntity::A,
            DateFixtures::feb(5),
            -MoneyFixtures::gross_121k(),
        )
        .with_net(MoneyFixtures::net_100k())
        .with_reference("NC-A-0001")
        .as_shared()
    }

    /// B owes A 10,000 (older) and 8,000 (newer)
    pub fn b_owes_a_two_liabilities() -> Vec<CrossEntityLiability> {
        vec![
            Self::outstanding(LegalEntity::B, dec!(10000), DateFixtures::jan(5)),
            Self::outstanding(LegalEntity::B, dec!(8000), DateFixtures::jan(20)),
        ]
    }

    /// An outstanding, untouched liability
    pub fn outstanding(payer: LegalEntity, amount: Decimal, source_date: NaiveDate) -> CrossEntityLiability {
        let invoice_id = InvoiceId::new();
        let amount = MoneyFixtures::amount(amount);
        CrossEntityLiability {
            id: CrossEntityLiability::id_for(invoice_id),
            invoice_id,
            vendor_id: IdFixtures::vendor_id(),
            payer,
            receiver: payer.complement(),
            amount,
            remaining: amount,
            source_date,
            settled: false,
            cancelled: false,
        }
    }
}
