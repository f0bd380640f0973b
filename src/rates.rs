// 💱 Exchange Rate Table - USD multipliers for GBP, EUR, INR
// Loaded once per run from a `Currency,Rate` CSV, read-only afterwards.

use crate::error::{EtlError, Result};
use crate::extract::fetch_document;
use crate::records::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: String,
}

/// Validated mapping from currency to a positive USD multiplier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeRateTable {
    rates: BTreeMap<Currency, Decimal>,
}

impl ExchangeRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete table; fails unless every required currency is given once
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Currency, Decimal)>,
    {
        let mut table = ExchangeRateTable::new();
        for (currency, rate) in pairs {
            table.insert(currency, rate)?;
        }
        table.ensure_complete()?;
        Ok(table)
    }

    /// Add one rate; rejects non-positive values and duplicates
    pub fn insert(&mut self, currency: Currency, rate: Decimal) -> Result<()> {
        if rate <= Decimal::ZERO {
            return Err(EtlError::RateTable(format!(
                "rate for {} must be positive, got {}",
                currency.code(),
                rate
            )));
        }
        if self.rates.contains_key(&currency) {
            return Err(EtlError::RateTable(format!(
                "duplicate rate for {}",
                currency.code()
            )));
        }
        self.rates.insert(currency, rate);
        Ok(())
    }

    /// Multiplier for `currency`, or RateTableError when absent
    pub fn rate(&self, currency: Currency) -> Result<Decimal> {
        self.rates.get(&currency).copied().ok_or_else(|| {
            EtlError::RateTable(format!("missing rate for {}", currency.code()))
        })
    }

    pub fn ensure_complete(&self) -> Result<()> {
        for currency in Currency::REQUIRED {
            self.rate(currency)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Fetch and parse the rate file at `source` (URL or local path)
pub fn load_rates(source: &str, timeout: Duration) -> Result<ExchangeRateTable> {
    let text = fetch_document(source, timeout)
        .map_err(|e| EtlError::RateTable(format!("rate file unavailable: {}", e)))?;
    let table = parse_rates(&text)?;
    info!(source, currencies = table.len(), "Loaded exchange rates");
    Ok(table)
}

/// Parse `Currency,Rate` CSV text. Currencies other than GBP/EUR/INR are ignored.
pub fn parse_rates(text: &str) -> Result<ExchangeRateTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut table = ExchangeRateTable::new();

    for result in reader.deserialize() {
        let row: RateRow = result
            .map_err(|e| EtlError::RateTable(format!("malformed rate row: {}", e)))?;

        let Some(currency) = Currency::from_code(&row.currency) else {
            debug!(currency = %row.currency, "Ignoring unused currency");
            continue;
        };

        let rate = Decimal::from_str(&row.rate).map_err(|e| {
            EtlError::RateTable(format!(
                "rate '{}' for {} is not a number: {}",
                row.rate,
                currency.code(),
                e
            ))
        })?;

        table.insert(currency, rate)?;
    }

    table.ensure_complete()?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_rate_file() {
        let table = parse_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rate(Currency::Gbp).unwrap(), dec("0.8"));
        assert_eq!(table.rate(Currency::Eur).unwrap(), dec("0.93"));
        assert_eq!(table.rate(Currency::Inr).unwrap(), dec("82.95"));
    }

    #[test]
    fn test_extra_currencies_ignored() {
        let table = parse_rates("Currency,Rate\nJPY,148.2\nEUR,0.93\nGBP,0.8\nINR,82.95\n").unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_missing_currency_is_rate_error() {
        let result = parse_rates("Currency,Rate\nEUR,0.93\nGBP,0.8\n");
        assert!(matches!(result, Err(EtlError::RateTable(_))));
    }

    #[test]
    fn test_duplicate_currency_is_rate_error() {
        let result = parse_rates("Currency,Rate\nEUR,0.93\nEUR,0.94\nGBP,0.8\nINR,82.95\n");
        assert!(matches!(result, Err(EtlError::RateTable(_))));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let mut table = ExchangeRateTable::new();
        assert!(table.insert(Currency::Gbp, Decimal::ZERO).is_err());
        assert!(table.insert(Currency::Gbp, dec("-0.8")).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_rejected_duplicate_keeps_first_rate() {
        let mut table = ExchangeRateTable::new();
        table.insert(Currency::Eur, dec("0.93")).unwrap();

        assert!(table.insert(Currency::Eur, dec("0.99")).is_err());
        assert_eq!(table.rate(Currency::Eur).unwrap(), dec("0.93"));
    }

    #[test]
    fn test_unparsable_rate_is_rate_error() {
        let result = parse_rates("Currency,Rate\nEUR,abc\nGBP,0.8\nINR,82.95\n");
        assert!(matches!(result, Err(EtlError::RateTable(_))));
    }

    #[test]
    fn test_missing_rate_file_is_rate_error() {
        let result = load_rates("/nonexistent/exchange_rate.csv", Duration::from_secs(1));
        assert!(matches!(result, Err(EtlError::RateTable(_))));
    }

    #[test]
    fn test_from_pairs_requires_all_currencies() {
        let partial = ExchangeRateTable::from_pairs([(Currency::Gbp, dec("0.8"))]);
        assert!(partial.is_err());

        let full = ExchangeRateTable::from_pairs([
            (Currency::Gbp, dec("0.8")),
            (Currency::Eur, dec("0.93")),
            (Currency::Inr, dec("82.95")),
        ]);
        assert!(full.is_ok());
    }
}
