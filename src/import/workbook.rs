//! Spreadsheet workbook (xlsx, xls, ods) reading via calamine.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use super::{sheet_table_name, Cell, RawTable};
use crate::error::{ParleyError, Result};

/// Reads every sheet of a workbook. Sheets without data are skipped.
pub(super) fn read_workbook(path: &Path, stem: &str) -> Result<Vec<RawTable>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ParleyError::import(format!("Failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names();
    if sheet_names.is_empty() {
        return Err(ParleyError::import("Workbook contains no sheets"));
    }

    let mut tables = Vec::with_capacity(sheet_names.len());
    for sheet in &sheet_names {
        let range = workbook.worksheet_range(sheet).map_err(|e| {
            ParleyError::import(format!("Failed to read sheet '{sheet}': {e}"))
        })?;

        match range_to_table(&range, &sheet_table_name(stem, sheet)) {
            Some(table) => tables.push(table),
            None => debug!(sheet = %sheet, "Skipping empty sheet"),
        }
    }

    Ok(tables)
}

/// Converts a sheet range; the first row is the header row.
fn range_to_table(range: &Range<Data>, name: &str) -> Option<RawTable> {
    let mut rows = range.rows();
    let headers = rows.next()?.iter().map(|d| d.to_string()).collect();

    let rows = rows
        .map(|row| row.iter().map(to_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| *c != Cell::Empty))
        .collect();

    Some(RawTable {
        name: name.to_string(),
        headers,
        rows,
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Int(i64::from(*b)),
        // Serial day number; calamine exposes no calendar conversion here.
        Data::DateTime(dt) => Cell::Float(dt.as_f64()),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
