// ⚠️ Error taxonomy for the ETL run
// One variant per pipeline stage; any of them aborts the run.

use thiserror::Error;

/// Stage errors. Every variant is terminal for a run (fail-fast).
#[derive(Debug, Error)]
pub enum EtlError {
    /// Document (or rate file) could not be retrieved
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Expected structure missing: anchor, table or a malformed row
    #[error("parse failed: {0}")]
    Parse(String),

    /// Missing, duplicated or malformed currency rate
    #[error("exchange rate table invalid: {0}")]
    RateTable(String),

    /// CSV output could not be written or read back
    #[error("I/O failure: {0}")]
    Io(String),

    /// Relational store could not be opened or written
    #[error("store failure: {0}")]
    Store(String),

    /// Invalid statement, absent table, or absent store
    #[error("query failed: {0}")]
    Query(String),

    /// Unreadable or invalid configuration file
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;

impl EtlError {
    /// Short stage name, used in the summary printed by the binary
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Fetch(_) => "FetchError",
            EtlError::Parse(_) => "ParseError",
            EtlError::RateTable(_) => "RateTableError",
            EtlError::Io(_) => "IOError",
            EtlError::Store(_) => "StoreError",
            EtlError::Query(_) => "QueryError",
            EtlError::Config(_) => "ConfigError",
        }
    }
}
