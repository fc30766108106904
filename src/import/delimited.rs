//! Delimited text (CSV/TSV) reading.

use std::path::Path;

use super::{Cell, RawTable};
use crate::error::{ParleyError, Result};

/// Lines inspected when guessing the delimiter.
const SNIFF_LINES: usize = 10;

/// Detects the most likely field delimiter by checking consistency across
/// the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The delimiter that produces the most consistent field count (>1 field)
/// wins. Falls back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(SNIFF_LINES).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Reads a delimited file. The first record is the header row.
pub(super) fn read_delimited(path: &Path, stem: &str) -> Result<RawTable> {
    let bytes = std::fs::read(path)
        .map_err(|e| ParleyError::import(format!("Cannot read {}: {e}", path.display())))?;
    let decoded = String::from_utf8_lossy(&bytes);
    let content: &str = &decoded;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let delimiter = if path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
    {
        b'\t'
    } else {
        sniff_delimiter(content)
    };

    parse_delimited(content, delimiter, stem)
        .map_err(|e| ParleyError::import(format!("Malformed file {}: {e}", path.display())))
}

fn parse_delimited(content: &str, delimiter: u8, name: &str) -> std::result::Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable {
        name: name.to_string(),
        headers,
        rows,
    })
}
