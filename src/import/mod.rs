//! File import into the store.
//!
//! Delimited text files become one table named after the file stem;
//! spreadsheet workbooks become one table per sheet. Column types are
//! inferred from the data and any same-named table is replaced.

mod delimited;
mod workbook;

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::db::{Column, Row, SqliteStore, Value};
use crate::error::{ParleyError, Result};

pub use delimited::sniff_delimiter;

/// Extensions read as delimited text.
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Extensions read as spreadsheet workbooks.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Summary of one table written by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub row_count: usize,
}

/// Inferred SQLite column affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }
}

/// A cell as read from a source file, before type inference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    /// Raw text. Numeric-looking text still counts as a number.
    Text(String),
}

impl Cell {
    /// Narrowest type this cell fits, or `None` when empty.
    fn kind(&self) -> Option<ColumnType> {
        match self {
            Cell::Empty => None,
            Cell::Int(_) => Some(ColumnType::Integer),
            Cell::Float(f) if is_integral(*f) => Some(ColumnType::Integer),
            Cell::Float(_) => Some(ColumnType::Real),
            Cell::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else if s.parse::<i64>().is_ok() {
                    Some(ColumnType::Integer)
                } else if parse_finite(s).is_some() {
                    Some(ColumnType::Real)
                } else {
                    Some(ColumnType::Text)
                }
            }
        }
    }

    fn into_value(self, column_type: ColumnType) -> Value {
        match (self, column_type) {
            (Cell::Empty, _) => Value::Null,
            (Cell::Text(s), _) if s.trim().is_empty() => Value::Null,

            (Cell::Int(i), ColumnType::Integer) => Value::Int(i),
            (Cell::Float(f), ColumnType::Integer) => Value::Int(f as i64),
            (Cell::Text(s), ColumnType::Integer) => {
                s.trim().parse().map(Value::Int).unwrap_or(Value::String(s))
            }

            (Cell::Int(i), ColumnType::Real) => Value::Float(i as f64),
            (Cell::Float(f), ColumnType::Real) => Value::Float(f),
            (Cell::Text(s), ColumnType::Real) => match parse_finite(s.trim()) {
                Some(f) => Value::Float(f),
                None => Value::String(s),
            },

            (Cell::Int(i), ColumnType::Text) => Value::String(i.to_string()),
            (Cell::Float(f), ColumnType::Text) => Value::String(f.to_string()),
            (Cell::Text(s), ColumnType::Text) => Value::String(s),
        }
    }
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// A table read from a file, before type inference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Infers column types, cleans header names and converts cells.
    pub(crate) fn into_typed(self) -> (Vec<Column>, Vec<Row>) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let names = normalize_headers(&self.headers, width);
        let types: Vec<ColumnType> = (0..width)
            .map(|i| infer_column_type(self.rows.iter().filter_map(|row| row.get(i))))
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row.into_iter()
                    .zip(&types)
                    .map(|(cell, ty)| cell.into_value(*ty))
                    .collect()
            })
            .collect();

        let columns = names
            .into_iter()
            .zip(&types)
            .map(|(name, ty)| Column::new(name, ty.as_sql()))
            .collect();

        (columns, rows)
    }
}

/// All non-empty values integers -> INTEGER; all numeric -> REAL;
/// otherwise TEXT. A column with no values is TEXT.
pub(crate) fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Cell>) -> ColumnType {
    let mut seen = false;
    let mut widest = ColumnType::Integer;
    for kind in cells.filter_map(Cell::kind) {
        seen = true;
        match kind {
            ColumnType::Text => return ColumnType::Text,
            ColumnType::Real => widest = ColumnType::Real,
            ColumnType::Integer => {}
        }
    }
    if seen {
        widest
    } else {
        ColumnType::Text
    }
}

/// Blank names become `column_{n}` (1-based); repeats get `_{n}` suffixes.
pub fn normalize_headers(headers: &[String], width: usize) -> Vec<String> {
    let mut used = HashSet::new();
    (0..width)
        .map(|i| {
            let base = headers
                .get(i)
                .map(|h| h.trim())
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("column_{}", i + 1));

            let mut name = base.clone();
            let mut n = 1;
            while !used.insert(name.to_lowercase()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Table name for one sheet of a workbook.
pub fn sheet_table_name(stem: &str, sheet: &str) -> String {
    format!("{stem}_{}", sheet.trim().replace(' ', "_"))
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ParleyError::import(format!("Invalid file name: {}", path.display())))
}

/// Reads `path` into raw tables without touching the store.
pub(crate) fn read_file(path: &Path) -> Result<Vec<RawTable>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let stem = file_stem(path)?;

    if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(vec![delimited::read_delimited(path, &stem)?])
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        workbook::read_workbook(path, &stem)
    } else {
        Err(ParleyError::import(format!(
            "Unsupported file type: {}. Use CSV, TSV or an Excel/ODS workbook.",
            path.display()
        )))
    }
}

/// Imports a file into the store, replacing same-named tables.
pub async fn import_file(store: &SqliteStore, path: &Path) -> Result<Vec<ImportedTable>> {
    if !path.is_file() {
        return Err(ParleyError::import(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let mut imported = Vec::new();
    for raw in read_file(path)? {
        let name = raw.name.clone();
        let (columns, rows) = raw.into_typed();
        if columns.is_empty() {
            info!(table = %name, "Skipping empty table");
            continue;
        }

        store.replace_table(&name, &columns, &rows).await?;
        imported.push(ImportedTable {
            name,
            columns,
            row_count: rows.len(),
        });
    }

    info!(path = %path.display(), tables = imported.len(), "Imported file");
    Ok(imported)
}
