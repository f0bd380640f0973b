// 🔁 Transformer - derive GBP/EUR/INR market caps from USD
//
// Rounding: 2 fractional digits, midpoint away from zero (half-up for the
// non-negative figures this job sees), exact decimal arithmetic.

use crate::error::{EtlError, Result};
use crate::rates::ExchangeRateTable;
use crate::records::{BankRecord, Currency, EnrichedBankRecord};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

/// Fractional digits kept for every market-cap column
pub const MONEY_SCALE: u32 = 2;

/// Round to [`MONEY_SCALE`] digits and pad so output always shows two decimals
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Enrich every record, preserving order. Fails if any rate is missing.
pub fn transform(records: &[BankRecord], rates: &ExchangeRateTable) -> Result<Vec<EnrichedBankRecord>> {
    let gbp = rates.rate(Currency::Gbp)?;
    let eur = rates.rate(Currency::Eur)?;
    let inr = rates.rate(Currency::Inr)?;

    let enriched = records
        .iter()
        .map(|record| {
            let usd = record.market_cap_usd;
            Ok(EnrichedBankRecord {
                name: record.name.clone(),
                market_cap_usd: round_money(usd),
                market_cap_gbp: convert(record, gbp, Currency::Gbp)?,
                market_cap_eur: convert(record, eur, Currency::Eur)?,
                market_cap_inr: convert(record, inr, Currency::Inr)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = enriched.len(), "Transformed records");
    Ok(enriched)
}

fn convert(record: &BankRecord, rate: Decimal, currency: Currency) -> Result<Decimal> {
    record
        .market_cap_usd
        .checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| {
            EtlError::Parse(format!(
                "market cap {} of '{}' overflows when converted to {}",
                record.market_cap_usd,
                record.name,
                currency.code()
            ))
        })
}
