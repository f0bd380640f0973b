// ⚙️ Configuration - every location the job touches
// Defaults reproduce the quarterly report setup; a TOML file may override any field.

use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";
pub const DEFAULT_ANCHOR_ID: &str = "By_market_capitalization";
pub const DEFAULT_RATE_SOURCE: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv";

/// Placeholder substituted with the configured table name in `queries`
pub const TABLE_PLACEHOLDER: &str = "{table}";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// HTML document: `http(s)://` URL or local path
    pub source_url: String,

    /// id of the heading element the market-cap table follows
    pub anchor_id: String,

    /// Exchange rate CSV (`Currency,Rate`): URL or local path
    pub rate_source: String,

    pub csv_path: PathBuf,
    pub store_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,

    /// Applied to every HTTP fetch
    pub http_timeout_secs: u64,

    /// Read-only statements run after loading; `{table}` is substituted
    pub queries: Vec<String>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            anchor_id: DEFAULT_ANCHOR_ID.to_string(),
            rate_source: DEFAULT_RATE_SOURCE.to_string(),
            csv_path: PathBuf::from("./Largest_banks_data.csv"),
            store_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_path: PathBuf::from("code_log.txt"),
            http_timeout_secs: 30,
            queries: vec![
                "SELECT * FROM {table}".to_string(),
                "SELECT AVG(MC_GBP_Billion) FROM {table}".to_string(),
                "SELECT Name, MC_USD_Billion FROM {table} LIMIT 5".to_string(),
            ],
        }
    }
}

impl EtlConfig {
    /// Defaults, or the given TOML file layered over them
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                debug!("No config file given, using defaults");
                EtlConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: EtlConfig = toml::from_str(&text).map_err(|e| {
            EtlError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_sql_identifier(&self.table_name) {
            return Err(EtlError::Config(format!(
                "table_name '{}' is not a plain SQL identifier",
                self.table_name
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(EtlError::Config("http_timeout_secs must be positive".into()));
        }
        if self.queries.is_empty() {
            return Err(EtlError::Config("at least one query is required".into()));
        }
        Ok(())
    }

    /// Queries with the table placeholder filled in
    pub fn resolved_queries(&self) -> Vec<String> {
        self.queries
            .iter()
            .map(|q| q.replace(TABLE_PLACEHOLDER, &self.table_name))
            .collect()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_report_setup() {
        let config = EtlConfig::default();
        assert_eq!(config.table_name, "Largest_banks");
        assert_eq!(config.store_path, PathBuf::from("Banks.db"));
        assert_eq!(config.log_path, PathBuf::from("code_log.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_rate_source_is_remote_file() {
        let config = EtlConfig::default();
        assert_eq!(
            config.rate_source,
            "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMSkillsNetwork-PY0221EN-Coursera/labs/v2/exchange_rate.csv"
        );
        assert!(config.source_url.starts_with("https://"));
    }

    #[test]
    fn test_resolved_queries_substitute_table() {
        let config = EtlConfig::default();
        let queries = config.resolved_queries();
        assert_eq!(queries[0], "SELECT * FROM Largest_banks");
        assert_eq!(queries[2], "SELECT Name, MC_USD_Billion FROM Largest_banks LIMIT 5");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table_name = \"Top_banks\"").unwrap();
        writeln!(file, "csv_path = \"out/banks.csv\"").unwrap();

        let config = EtlConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.table_name, "Top_banks");
        assert_eq!(config.csv_path, PathBuf::from("out/banks.csv"));
        assert_eq!(config.anchor_id, DEFAULT_ANCHOR_ID);
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let config = EtlConfig {
            table_name: "banks; DROP TABLE x".to_string(),
            ..EtlConfig::default()
        };
        assert!(matches!(config.validate(), Err(EtlError::Config(_))));
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_name = \"x.db\"").unwrap();
        assert!(matches!(
            EtlConfig::load(Some(file.path())),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("Largest_banks"));
        assert!(is_sql_identifier("_t1"));
        assert!(!is_sql_identifier("1banks"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("a-b"));
    }
}
