use anyhow::Result;
use banks_etl::log::init_logging;
use banks_etl::{EtlConfig, EtlError};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML file overriding the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = EtlConfig::load(cli.config.as_deref())?;

    println!("🏦 Largest banks ETL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Reported once, by anyhow, on the way out of main
    let summary = banks_etl::run(&config)
        .map_err(|e| anyhow::anyhow!(failure_message(&e, &config.log_path)))?;

    println!("✓ Extracted {} banks", summary.extracted);
    println!("✓ CSV: {} rows → {}", summary.csv_rows, config.csv_path.display());
    println!(
        "✓ Table {}: {} rows → {}",
        config.table_name,
        summary.store_rows,
        config.store_path.display()
    );

    for result in &summary.queries {
        println!("\n{}", result.sql);
        println!("{}", result);
        println!("\n{}", "=".repeat(50));
    }

    Ok(())
}

fn failure_message(error: &EtlError, log_path: &Path) -> String {
    format!(
        "{} - {} (see {} for the run trail)",
        error.kind(),
        error,
        log_path.display()
    )
}
