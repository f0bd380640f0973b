// 🚚 Pipeline - Extract → Transform → CSV → Store → Queries
//
// Strictly linear and fail-fast: the first stage error ends the run after a
// failure line is logged. Outputs already written are left in place.

use crate::config::EtlConfig;
use crate::csv_sink::{read_csv, write_csv};
use crate::db::{count_rows, write_table};
use crate::error::{EtlError, Result};
use crate::extract::extract;
use crate::progress::ProgressLog;
use crate::query::{run_query, QueryResult};
use crate::rates::load_rates;
use crate::transform::transform;
use std::time::Duration;
use tracing::info;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub extracted: usize,
    pub csv_rows: usize,
    pub store_rows: usize,
    pub queries: Vec<QueryResult>,
}

/// Run every stage with progress logging; the failure (if any) is logged then returned
pub fn run(config: &EtlConfig) -> Result<RunSummary> {
    let progress = ProgressLog::new(&config.log_path);

    let result = run_stages(config, &progress);
    if let Err(e) = &result {
        progress.log(&format!("ETL Job Failed: {}", e));
    }
    result
}

fn run_stages(config: &EtlConfig, progress: &ProgressLog) -> Result<RunSummary> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    progress.log("Preliminaries complete. Initiating ETL process");

    let records = extract(&config.source_url, &config.anchor_id, timeout)?;
    progress.log("Data extraction complete. Initiating Transformation process");

    let rates = load_rates(&config.rate_source, timeout)?;
    let enriched = transform(&records, &rates)?;
    progress.log("Data transformation complete. Initiating Loading process");

    let csv_rows = write_csv(&enriched, &config.csv_path)?;
    progress.log("Data saved to CSV file");

    progress.log("SQL Connection initiated");
    let store_rows = write_table(&enriched, &config.store_path, &config.table_name)?;

    // Both outputs are re-read, not trusted from the writers' return values
    let in_csv = read_csv(&config.csv_path)?.len();
    let in_table = count_rows(&config.store_path, &config.table_name)?;
    if in_csv != records.len() || in_table != records.len() as i64 {
        return Err(EtlError::Store(format!(
            "row count mismatch: extracted {}, csv {}, table {}",
            records.len(),
            in_csv,
            in_table
        )));
    }
    progress.log("Data loaded to Database as a table, Executing queries");

    let queries = config
        .resolved_queries()
        .iter()
        .map(|sql| run_query(sql, &config.store_path))
        .collect::<Result<Vec<_>>>()?;
    progress.log("Process Complete");

    progress.log("Server Connection closed");

    info!(
        extracted = records.len(),
        csv_rows,
        store_rows,
        queries = queries.len(),
        "Run finished"
    );

    Ok(RunSummary {
        extracted: records.len(),
        csv_rows,
        store_rows,
        queries,
    })
}
