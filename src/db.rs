// 🗄️ Table Store Sink - SQLite table holding the enriched records
//
// Replace load: drop, recreate and repopulate inside one transaction, so a
// reader sees either the previous contents or the complete new set.

use crate::config::is_sql_identifier;
use crate::error::{EtlError, Result};
use crate::records::EnrichedBankRecord;
use crate::transform::round_money;
use rusqlite::{params, Connection, OpenFlags};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Open (creating if absent) the store in WAL mode
pub fn open_store(store_path: &Path) -> Result<Connection> {
    let conn = Connection::open(store_path)
        .map_err(|e| EtlError::Store(format!("cannot open {}: {}", store_path.display(), e)))?;

    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| EtlError::Store(format!("cannot enable WAL on {}: {}", store_path.display(), e)))?;

    debug!(path = %store_path.display(), "Store opened");
    Ok(conn)
}

/// Replace the contents of `table_name` with `records`
pub fn write_table(records: &[EnrichedBankRecord], store_path: &Path, table_name: &str) -> Result<usize> {
    checked_table_name(table_name).map_err(EtlError::Store)?;

    let mut conn = open_store(store_path)?;
    let store_err = |e: rusqlite::Error| EtlError::Store(format!("writing table {}: {}", table_name, e));

    let tx = conn.transaction().map_err(store_err)?;

    tx.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table_name), [])
        .map_err(store_err)?;

    // ==========================================================================
    // Same five columns as the CSV output
    // ==========================================================================
    tx.execute(
        &format!(
            "CREATE TABLE \"{}\" (
                Name TEXT,
                MC_USD_Billion REAL,
                MC_GBP_Billion REAL,
                MC_EUR_Billion REAL,
                MC_INR_Billion REAL
            )",
            table_name
        ),
        [],
    )
    .map_err(store_err)?;

    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO \"{}\" (Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                table_name
            ))
            .map_err(store_err)?;

        for record in records {
            stmt.execute(params![
                record.name,
                real(record.market_cap_usd)?,
                real(record.market_cap_gbp)?,
                real(record.market_cap_eur)?,
                real(record.market_cap_inr)?,
            ])
            .map_err(store_err)?;
        }
    }

    tx.commit().map_err(store_err)?;

    info!(table = table_name, rows = records.len(), "Loaded table");
    Ok(records.len())
}

/// Read the table back in insertion order
pub fn read_table(store_path: &Path, table_name: &str) -> Result<Vec<EnrichedBankRecord>> {
    checked_table_name(table_name).map_err(EtlError::Store)?;
    let conn = open_existing(store_path)?;
    let store_err = |e: rusqlite::Error| EtlError::Store(format!("reading table {}: {}", table_name, e));

    let mut stmt = conn
        .prepare(&format!(
            "SELECT Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
             FROM \"{}\"
             ORDER BY rowid",
            table_name
        ))
        .map_err(store_err)?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })
        .map_err(store_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(store_err)?;

    rows.into_iter()
        .map(|(name, usd, gbp, eur, inr)| {
            Ok(EnrichedBankRecord {
                name,
                market_cap_usd: decimal_from_real(usd)?,
                market_cap_gbp: decimal_from_real(gbp)?,
                market_cap_eur: decimal_from_real(eur)?,
                market_cap_inr: decimal_from_real(inr)?,
            })
        })
        .collect()
}

pub fn count_rows(store_path: &Path, table_name: &str) -> Result<i64> {
    checked_table_name(table_name).map_err(EtlError::Store)?;
    let conn = open_existing(store_path)?;

    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table_name), [], |row| row.get(0))
        .map_err(|e| EtlError::Store(format!("counting {}: {}", table_name, e)))?;

    Ok(count)
}

fn open_existing(store_path: &Path) -> Result<Connection> {
    connect_existing(store_path)
        .map_err(|e| EtlError::Store(format!("cannot open {}: {}", store_path.display(), e)))
}

/// Read-only and without SQLITE_OPEN_CREATE: a missing store is an error, not a new file
pub(crate) fn connect_existing(store_path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        store_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

fn checked_table_name(table_name: &str) -> std::result::Result<(), String> {
    if is_sql_identifier(table_name) {
        Ok(())
    } else {
        Err(format!("invalid table name '{}'", table_name))
    }
}

fn real(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| EtlError::Store(format!("{} does not fit a REAL column", value)))
}

/// Shortest decimal text of the float, back at money scale
fn decimal_from_real(value: f64) -> Result<Decimal> {
    Decimal::from_str(&value.to_string())
        .map(round_money)
        .map_err(|e| EtlError::Store(format!("stored value {} is not a decimal: {}", value, e)))
}
