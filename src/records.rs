// 🏦 Bank Records - typed rows flowing through the pipeline
// Extractor → BankRecord, Transformer → EnrichedBankRecord, sinks consume the latter

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// CURRENCY
// ============================================================================

/// Target currencies derived from the USD market cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    /// Every currency the transformer needs, in output column order
    pub const REQUIRED: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    /// ISO code as it appears in the exchange rate file
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    /// Case-insensitive lookup from a rate-file code
    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::REQUIRED
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One scraped row: bank name and market cap in billion USD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: Decimal,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, market_cap_usd: Decimal) -> Self {
        BankRecord {
            name: name.into(),
            market_cap_usd,
        }
    }
}

/// BankRecord plus converted market caps, all with 2 fractional digits.
///
/// Field names serialize to the CSV / table column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion", with = "rust_decimal::serde::str")]
    pub market_cap_usd: Decimal,

    #[serde(rename = "MC_GBP_Billion", with = "rust_decimal::serde::str")]
    pub market_cap_gbp: Decimal,

    #[serde(rename = "MC_EUR_Billion", with = "rust_decimal::serde::str")]
    pub market_cap_eur: Decimal,

    #[serde(rename = "MC_INR_Billion", with = "rust_decimal::serde::str")]
    pub market_cap_inr: Decimal,
}

/// Column names shared by the CSV header and the store table schema
pub const COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

impl EnrichedBankRecord {
    /// Converted value for one target currency
    pub fn market_cap(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Gbp => self.market_cap_gbp,
            Currency::Eur => self.market_cap_eur,
            Currency::Inr => self.market_cap_inr,
        }
    }
}
