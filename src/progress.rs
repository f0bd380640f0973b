// 📝 Progress Log - flat, append-only audit trail of pipeline milestones
//
// One line per call: `YYYY-Mon-DD HH:MM:SS, <message>`. Writing is best
// effort and never fails the pipeline.

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// chrono format for `2023-Sep-08 09:16:35`
pub const TIMESTAMP_FORMAT: &str = "%Y-%b-%d %H:%M:%S";

const SEPARATOR: &str = ", ";

/// One parsed line of the progress log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLogEntry {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

impl ProgressLogEntry {
    pub fn new(timestamp: NaiveDateTime, message: &str) -> Self {
        ProgressLogEntry {
            timestamp,
            // a message must never span lines
            message: message.replace(['\r', '\n'], " "),
        }
    }

    pub fn parse(line: &str) -> Option<Self> {
        let (timestamp, message) = line.split_once(SEPARATOR)?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
        Some(ProgressLogEntry {
            timestamp,
            message: message.to_string(),
        })
    }
}

impl fmt::Display for ProgressLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            SEPARATOR,
            self.message
        )
    }
}

#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProgressLog { path: path.into() }
    }

    /// Append `message` with the current local time. Retries once, then warns.
    pub fn log(&self, message: &str) {
        info!(target: "progress", "{}", message);

        if let Err(first) = self.try_log(message) {
            if let Err(second) = self.try_log(message) {
                warn!(
                    path = %self.path.display(),
                    error = %second,
                    first_error = %first,
                    "Could not write progress log"
                );
            }
        }
    }

    pub fn try_log(&self, message: &str) -> io::Result<()> {
        let entry = ProgressLogEntry::new(Local::now().naive_local(), message);

        // Handle is closed when `file` drops, also on the error path
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", entry)?;
        file.flush()
    }

    /// Every parseable entry currently in the file
    pub fn entries(&self) -> io::Result<Vec<ProgressLogEntry>> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text.lines().filter_map(ProgressLogEntry::parse).collect())
    }
}
