// 📄 CSV Sink - final record set as a flat file
// Overwrites the target; header is always written, even for zero rows.

use crate::error::{EtlError, Result};
use crate::records::{EnrichedBankRecord, COLUMNS};
use std::path::Path;
use tracing::info;

pub fn write_csv(records: &[EnrichedBankRecord], path: &Path) -> Result<usize> {
    let io_err = |e: csv::Error| EtlError::Io(format!("cannot write {}: {}", path.display(), e));

    // Header written by hand so an empty record set still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(io_err)?;

    writer.write_record(COLUMNS).map_err(io_err)?;
    for record in records {
        writer.serialize(record).map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| EtlError::Io(format!("cannot flush {}: {}", path.display(), e)))?;

    info!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(records.len())
}

/// Read a file produced by [`write_csv`] back into typed records
pub fn read_csv(path: &Path) -> Result<Vec<EnrichedBankRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| EtlError::Io(format!("cannot open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| EtlError::Io(format!("cannot read header of {}: {}", path.display(), e)))?;
    if headers.iter().ne(COLUMNS) {
        return Err(EtlError::Io(format!(
            "unexpected header in {}: {:?}",
            path.display(),
            headers
        )));
    }

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<EnrichedBankRecord>, _>>()
        .map_err(|e| EtlError::Io(format!("malformed row in {}: {}", path.display(), e)))
}
