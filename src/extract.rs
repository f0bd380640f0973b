// 🔎 Extractor - fetch the source page and parse the anchored market-cap table
//
// The table is located by the id of the heading that precedes it, never by
// its position on the page. Rows are parsed straight into BankRecord.

use crate::error::{EtlError, Result};
use crate::records::BankRecord;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Column holding the bank name (0-based, rank column first)
const NAME_COLUMN: usize = 1;
/// Column holding market cap in billion USD
const MARKET_CAP_COLUMN: usize = 2;

// ============================================================================
// FETCH
// ============================================================================

/// Retrieve a document as text.
///
/// `http://` and `https://` locations go over the network with the given
/// timeout; anything else (optionally prefixed `file://`) is read from disk.
pub fn fetch_document(location: &str, timeout: Duration) -> Result<String> {
    if is_http(location) {
        fetch_http(location, timeout)
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        debug!(path, "Reading local document");
        fs::read_to_string(path)
            .map_err(|e| EtlError::Fetch(format!("cannot read {}: {}", path, e)))
    }
}

fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn fetch_http(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("banks-etl/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EtlError::Fetch(format!("cannot build HTTP client: {}", e)))?;

    debug!(url, "GET");
    let response = client
        .get(url)
        .send()
        .map_err(|e| EtlError::Fetch(format!("request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EtlError::Fetch(format!("{} returned HTTP {}", url, status)));
    }

    response
        .text()
        .map_err(|e| EtlError::Fetch(format!("cannot read body of {}: {}", url, e)))
}

// ============================================================================
// PARSE
// ============================================================================

/// Fetch `source` and return its ranked bank rows in page order
pub fn extract(source: &str, anchor_id: &str, timeout: Duration) -> Result<Vec<BankRecord>> {
    let html = fetch_document(source, timeout)?;
    let records = parse_bank_table(&html, anchor_id)?;
    info!(source, rows = records.len(), "Extracted bank table");
    Ok(records)
}

/// Parse the first table following the element whose id is `anchor_id`.
///
/// Header rows (no `<td>`) and rows without both a name and a market cap
/// are skipped. A market cap that is present but not numeric is an error,
/// as is a table with no usable rows.
pub fn parse_bank_table(html: &str, anchor_id: &str) -> Result<Vec<BankRecord>> {
    let document = Html::parse_document(html);
    let table = find_table_after_anchor(&document, anchor_id)?;

    let mut records = Vec::new();

    let rows = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr");

    for (index, row) in rows.enumerate() {
        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();

        if cells.is_empty() {
            continue;
        }
        if cells.len() <= MARKET_CAP_COLUMN {
            debug!(row = index, cells = cells.len(), "Skipping short row");
            continue;
        }

        let name = cell_text(&cells[NAME_COLUMN]);
        let amount = clean_number(&cell_text(&cells[MARKET_CAP_COLUMN]));
        if name.is_empty() || amount.is_empty() {
            debug!(row = index, "Skipping row without name and market cap");
            continue;
        }

        let market_cap_usd = Decimal::from_str(&amount).map_err(|e| {
            EtlError::Parse(format!(
                "market cap '{}' for '{}' is not numeric: {}",
                amount, name, e
            ))
        })?;

        records.push(BankRecord::new(name, market_cap_usd));
    }

    if records.is_empty() {
        return Err(EtlError::Parse(format!(
            "table after anchor '{}' has no data rows",
            anchor_id
        )));
    }

    Ok(records)
}

fn find_table_after_anchor<'a>(document: &'a Html, anchor_id: &str) -> Result<ElementRef<'a>> {
    // Pre-order traversal is document order
    let mut elements = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap);

    if !elements.by_ref().any(|el| el.value().id() == Some(anchor_id)) {
        return Err(EtlError::Parse(format!("anchor '{}' not found", anchor_id)));
    }

    elements
        .find(|el| el.value().name() == "table")
        .ok_or_else(|| EtlError::Parse(format!("no table follows anchor '{}'", anchor_id)))
}

/// Visible text with whitespace runs collapsed
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop thousands separators, whitespace and footnote markers like `[a]`
fn clean_number(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut in_footnote = false;

    for c in text.chars() {
        match c {
            '[' => in_footnote = true,
            ']' => in_footnote = false,
            _ if in_footnote => {}
            ',' => {}
            c if c.is_whitespace() => {}
            c => cleaned.push(c),
        }
    }

    cleaned
}
