//! CSV export of query results.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::db::QueryResult;
use crate::error::{ParleyError, Result};

/// File name used when exporting into a directory.
pub const EXPORT_FILE_NAME: &str = "query_results.csv";

/// Serializes a result as UTF-8 CSV: header row, then one line per row.
/// NULL becomes an empty field.
pub fn to_csv_bytes(result: &QueryResult) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);

        wtr.write_record(result.column_names())
            .map_err(|e| ParleyError::export(e.to_string()))?;

        for row in &result.rows {
            wtr.write_record(row.iter().map(|v| v.to_csv_field()))
                .map_err(|e| ParleyError::export(e.to_string()))?;
        }

        wtr.flush()
            .map_err(|e| ParleyError::export(e.to_string()))?;
    }
    Ok(buf)
}

/// Writes the CSV payload to `target`. A directory target gets
/// `query_results.csv` inside it. Returns the path written.
pub fn write_csv(result: &QueryResult, target: &Path) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(EXPORT_FILE_NAME)
    } else {
        target.to_path_buf()
    };

    let bytes = to_csv_bytes(result)?;
    std::fs::write(&path, bytes).map_err(|e| {
        ParleyError::export(format!("Failed to write {}: {e}", path.display()))
    })?;

    info!(path = %path.display(), rows = result.row_count(), "Exported results");
    Ok(path)
}
