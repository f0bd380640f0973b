use banks_etl::{
    count_rows, read_csv, read_table, run, EtlConfig, EtlError, ProgressLog,
};
use rusqlite::types::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn scratch_config(dir: &TempDir) -> EtlConfig {
    EtlConfig {
        source_url: fixture("largest_banks.html"),
        rate_source: fixture("exchange_rate.csv"),
        csv_path: dir.path().join("Largest_banks_data.csv"),
        store_path: dir.path().join("Banks.db"),
        log_path: dir.path().join("code_log.txt"),
        ..EtlConfig::default()
    }
}

fn log_messages(path: &PathBuf) -> Vec<String> {
    ProgressLog::new(path)
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.message)
        .collect()
}

const MILESTONES: [&str; 8] = [
    "Preliminaries complete. Initiating ETL process",
    "Data extraction complete. Initiating Transformation process",
    "Data transformation complete. Initiating Loading process",
    "Data saved to CSV file",
    "SQL Connection initiated",
    "Data loaded to Database as a table, Executing queries",
    "Process Complete",
    "Server Connection closed",
];

#[test]
fn test_full_run_from_local_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = scratch_config(&dir);

    let summary = run(&config).unwrap();

    assert_eq!(summary.extracted, 10);
    assert_eq!(summary.csv_rows, 10);
    assert_eq!(summary.store_rows, 10);

    // CSV and table hold the same ranked records
    let from_csv = read_csv(&config.csv_path).unwrap();
    let from_table = read_table(&config.store_path, &config.table_name).unwrap();
    assert_eq!(from_csv, from_table);
    assert_eq!(from_csv[0].name, "JPMorgan Chase");
    assert_eq!(from_csv[9].name, "Bank of China");

    let csv_text = fs::read_to_string(&config.csv_path).unwrap();
    let mut lines = csv_text.lines();
    assert_eq!(
        lines.next(),
        Some("Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion")
    );
    assert_eq!(lines.next(), Some("JPMorgan Chase,432.92,346.34,402.62,35910.71"));

    // select-all, average, limit
    assert_eq!(summary.queries.len(), 3);
    assert_eq!(summary.queries[0].row_count(), 10);
    assert!(matches!(summary.queries[1].scalar(), Some(Value::Real(_))));
    assert_eq!(summary.queries[2].columns, vec!["Name", "MC_USD_Billion"]);
    assert_eq!(summary.queries[2].row_count(), 5);

    assert_eq!(log_messages(&config.log_path), MILESTONES);
}

#[test]
fn test_second_run_replaces_table_and_appends_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = scratch_config(&dir);

    run(&config).unwrap();
    run(&config).unwrap();

    assert_eq!(count_rows(&config.store_path, &config.table_name).unwrap(), 10);

    let entries = ProgressLog::new(&config.log_path).entries().unwrap();
    assert_eq!(entries.len(), 2 * MILESTONES.len());
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn test_missing_anchor_fails_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig {
        anchor_id: "By_revenue".to_string(),
        ..scratch_config(&dir)
    };

    let result = run(&config);

    assert!(matches!(result, Err(EtlError::Parse(_))));
    assert!(!config.csv_path.exists());
    assert!(!config.store_path.exists());

    let messages = log_messages(&config.log_path);
    assert_eq!(messages.len(), 2);
    assert!(messages[1].starts_with("ETL Job Failed: parse failed"));
}

#[test]
fn test_incomplete_rate_file_is_rate_table_error() {
    let dir = tempfile::tempdir().unwrap();
    let rates = dir.path().join("rates.csv");
    fs::write(&rates, "Currency,Rate\nEUR,0.93\nGBP,0.8\n").unwrap();

    let config = EtlConfig {
        rate_source: rates.to_string_lossy().into_owned(),
        ..scratch_config(&dir)
    };

    assert!(matches!(run(&config), Err(EtlError::RateTable(_))));
    assert!(!config.csv_path.exists());
}

#[test]
fn test_store_failure_leaves_csv_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig {
        store_path: dir.path().join("no_such_dir").join("Banks.db"),
        ..scratch_config(&dir)
    };

    let result = run(&config);

    assert!(matches!(result, Err(EtlError::Store(_))));
    assert_eq!(read_csv(&config.csv_path).unwrap().len(), 10);

    let messages = log_messages(&config.log_path);
    assert_eq!(messages.last().map(String::as_str).map(|m| m.starts_with("ETL Job Failed")), Some(true));
    assert!(!messages.iter().any(|m| m == "Process Complete"));
}

#[test]
fn test_invalid_query_is_query_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = EtlConfig {
        queries: vec!["SELECT Missing_column FROM {table}".to_string()],
        ..scratch_config(&dir)
    };

    assert!(matches!(run(&config), Err(EtlError::Query(_))));
    // loading finished before the query stage
    assert_eq!(count_rows(&config.store_path, &config.table_name).unwrap(), 10);
}
