// 📊 Query Runner - read-only statements against the loaded store

use crate::db::connect_existing;
use crate::error::{EtlError, Result};
use comfy_table::{presets::ASCII_FULL, Table};
use rusqlite::types::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Columns and rows of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Single value of a one-row, one-column result (e.g. an aggregate)
    pub fn scalar(&self) -> Option<&Value> {
        match (self.rows.as_slice(), self.columns.len()) {
            ([row], 1) => row.first(),
            _ => None,
        }
    }

    /// ASCII table with a header row
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        table.set_header(self.columns.clone());
        for row in &self.rows {
            table.add_row(row.iter().map(render_value).collect::<Vec<_>>());
        }
        table.to_string()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Execute one read-only statement against the store at `store_path`.
///
/// Fails with QueryError when the store or table does not exist, the SQL
/// is invalid, or the statement would modify the store.
pub fn run_query(sql: &str, store_path: &Path) -> Result<QueryResult> {
    let conn = connect_existing(store_path)
        .map_err(|e| EtlError::Query(format!("cannot open {}: {}", store_path.display(), e)))?;
    let query_err = |e: rusqlite::Error| EtlError::Query(format!("{}: {}", sql, e));

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    if !stmt.readonly() {
        return Err(EtlError::Query(format!("{}: statement would modify the store", sql)));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([]).map_err(query_err)?;
    while let Some(row) = cursor.next().map_err(query_err)? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_err)?;
        rows.push(values);
    }

    debug!(sql, rows = rows.len(), "Query executed");
    Ok(QueryResult {
        sql: sql.to_string(),
        columns,
        rows,
    })
}
