// Largest Banks ETL - Core Library
// Exposes every stage for the binary and the integration tests

pub mod config;
pub mod csv_sink;
pub mod db;
pub mod error;
pub mod extract;
pub mod log;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod rates;
pub mod records;
pub mod transform;

// Re-export commonly used types
pub use config::EtlConfig;
pub use csv_sink::{read_csv, write_csv};
pub use db::{count_rows, open_store, read_table, write_table};
pub use error::{EtlError, Result};
pub use extract::{extract, fetch_document, parse_bank_table};
pub use pipeline::{run, RunSummary};
pub use progress::{ProgressLog, ProgressLogEntry};
pub use query::{run_query, QueryResult};
pub use rates::{load_rates, parse_rates, ExchangeRateTable};
pub use records::{BankRecord, Currency, EnrichedBankRecord, COLUMNS};
pub use transform::{round_money, transform};
