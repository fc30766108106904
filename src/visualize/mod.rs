//! Table profiling and chart suggestions.
//!
//! Loads one table, summarizes it, keeps "safe" numeric columns, suggests
//! correlated pairs for bivariate charts and plans histograms for the
//! remaining columns. Rendering lives in [`render`].

pub mod render;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::db::{quote_identifier, DatabaseClient, QueryResult, Value};
use crate::error::{ParleyError, Result};

pub use render::{render_chart, render_plans, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Rows shown in the preview.
pub const PREVIEW_ROWS: usize = 5;

/// Minimum absolute Pearson correlation for a suggested pair.
pub const CORRELATION_THRESHOLD: f64 = 0.2;

/// Bins per histogram.
pub const HISTOGRAM_BINS: usize = 10;

/// Distinct values must stay below this share of the row count.
const MAX_DISTINCT_RATIO: f64 = 0.9;

/// Upper bound on `max / (min + 1e-5)` for a safe column.
const MAX_RANGE_RATIO: f64 = 1e4;

/// Bivariate chart styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Scatter,
    Line,
    Bar,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scatter => write!(f, "scatter"),
            Self::Line => write!(f, "line"),
            Self::Bar => write!(f, "bar"),
        }
    }
}

impl FromStr for ChartKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "scatter" => Ok(Self::Scatter),
            "line" => Ok(Self::Line),
            "bar" => Ok(Self::Bar),
            _ => Err(ParleyError::query(format!(
                "Unknown chart type: {s}. Use scatter, line or bar."
            ))),
        }
    }
}

/// Summary statistics for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    /// Non-null values.
    pub count: usize,
    pub distinct: usize,
    /// Set for numeric columns only.
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One histogram bucket covering `[lower, upper)`; the last is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// A chart ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartPlan {
    Bivariate {
        x: String,
        y: String,
        kind: ChartKind,
        /// Rows where both values are present.
        points: Vec<(f64, f64)>,
    },
    Histogram { column: String, bins: Vec<Bin> },
}

impl ChartPlan {
    pub fn title(&self) -> String {
        match self {
            Self::Bivariate { x, y, .. } => format!("{x} vs {y}"),
            Self::Histogram { column, .. } => format!("Distribution of {column}"),
        }
    }
}

/// Everything the visualizer shows for a table.
#[derive(Debug, Clone)]
pub struct TableProfile {
    pub table: String,
    pub data: QueryResult,
    pub summaries: Vec<ColumnSummary>,
    pub safe_columns: Vec<String>,
    /// Ordered `(x, y)` pairs with `|r| >= 0.2`.
    pub suggested_pairs: Vec<(String, String)>,
}

impl TableProfile {
    /// Profiles an already-loaded result.
    pub fn from_result(table: impl Into<String>, data: QueryResult) -> Self {
        let summaries = (0..data.column_count())
            .map(|i| summarize_column(&data, i))
            .collect();

        let safe_columns: Vec<String> = (0..data.column_count())
            .filter(|&i| {
                numeric_values(&data, i)
                    .is_some_and(|values| is_safe_numeric(&values, data.row_count()))
            })
            .map(|i| data.columns[i].name.clone())
            .collect();

        let suggested_pairs = suggest_pairs(&data, &safe_columns);
        debug!(
            safe = safe_columns.len(),
            pairs = suggested_pairs.len(),
            "Profiled table"
        );

        Self {
            table: table.into(),
            data,
            summaries,
            safe_columns,
            suggested_pairs,
        }
    }

    /// The first rows of the table.
    pub fn preview(&self) -> QueryResult {
        QueryResult::with_data(
            self.data.columns.clone(),
            self.data.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        )
    }

    /// Plans the charts: the chosen (or first suggested) pair, then a
    /// histogram for every safe column not in that pair.
    pub fn plan_charts(
        &self,
        pair: Option<(&str, &str)>,
        kind: ChartKind,
    ) -> Result<Vec<ChartPlan>> {
        let pair = match pair {
            Some((x, y)) => {
                if !self.suggested_pairs.iter().any(|(a, b)| a == x && b == y) {
                    return Err(ParleyError::query(format!(
                        "{x} vs {y} is not a suggested pair for {}",
                        self.table
                    )));
                }
                Some((x.to_string(), y.to_string()))
            }
            None => self.suggested_pairs.first().cloned(),
        };

        let mut plans = Vec::new();
        let mut plotted = HashSet::new();

        if let Some((x, y)) = pair {
            let points = self.paired_points(&x, &y);
            plotted.insert(x.clone());
            plotted.insert(y.clone());
            plans.push(ChartPlan::Bivariate { x, y, kind, points });
        }

        for column in self.safe_columns.iter().filter(|c| !plotted.contains(*c)) {
            let values = self
                .data
                .column_index(column)
                .and_then(|i| numeric_values(&self.data, i))
                .unwrap_or_default();
            let present: Vec<f64> = values.into_iter().flatten().collect();
            plans.push(ChartPlan::Histogram {
                column: column.clone(),
                bins: histogram(&present, HISTOGRAM_BINS),
            });
        }

        Ok(plans)
    }

    fn paired_points(&self, x: &str, y: &str) -> Vec<(f64, f64)> {
        let column = |name: &str| {
            self.data
                .column_index(name)
                .and_then(|i| numeric_values(&self.data, i))
                .unwrap_or_default()
        };
        column(x)
            .into_iter()
            .zip(column(y))
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect()
    }
}

/// Loads and profiles `table`.
pub async fn profile_table(db: &dyn DatabaseClient, table: &str) -> Result<TableProfile> {
    let tables = db.list_tables().await?;
    if !tables.iter().any(|t| t == table) {
        return Err(ParleyError::query(format!(
            "Unknown table: {table}. Use /tables to list tables."
        )));
    }

    let data = db
        .execute_query(&format!("SELECT * FROM {}", quote_identifier(table)))
        .await?;
    Ok(TableProfile::from_result(table, data))
}

/// Column values as numbers, `None` for NULL. Returns `None` when any
/// non-null value is not numeric or no non-null value exists.
pub fn numeric_values(data: &QueryResult, index: usize) -> Option<Vec<Option<f64>>> {
    let mut any = false;
    let mut values = Vec::with_capacity(data.row_count());
    for row in &data.rows {
        match row.get(index) {
            None | Some(Value::Null) => values.push(None),
            Some(value) => {
                values.push(Some(value.as_f64()?));
                any = true;
            }
        }
    }
    any.then_some(values)
}

/// `1 < distinct < 0.9 * rows` and `max / (min + 1e-5) < 1e4`.
pub fn is_safe_numeric(values: &[Option<f64>], row_count: usize) -> bool {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let distinct = distinct_count(&present);
    if distinct <= 1 || (distinct as f64) >= MAX_DISTINCT_RATIO * row_count as f64 {
        return false;
    }

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ratio = max / (min + 1e-5);
    ratio.is_finite() && ratio < MAX_RANGE_RATIO
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

/// Ordered pairs `(x, y)`, `x != y`, with `|r| >= 0.2`.
pub fn suggest_pairs(data: &QueryResult, columns: &[String]) -> Vec<(String, String)> {
    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| {
            data.column_index(c)
                .and_then(|i| numeric_values(data, i))
                .unwrap_or_default()
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, x) in columns.iter().enumerate() {
        for (j, y) in columns.iter().enumerate() {
            if i == j {
                continue;
            }
            if pearson(&values[i], &values[j]).is_some_and(|r| r.abs() >= CORRELATION_THRESHOLD) {
                pairs.push((x.clone(), y.clone()));
            }
        }
    }
    pairs
}

/// Equal-width histogram. A constant series lands in a single bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return vec![Bin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

fn distinct_count(values: &[f64]) -> usize {
    values
        .iter()
        .map(|v| if *v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect::<HashSet<_>>()
        .len()
}

fn summarize_column(data: &QueryResult, index: usize) -> ColumnSummary {
    let name = data.columns[index].name.clone();

    if let Some(values) = numeric_values(data, index) {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        let count = present.len();
        return ColumnSummary {
            name,
            count,
            distinct: distinct_count(&present),
            mean: Some(present.iter().sum::<f64>() / count as f64),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
        };
    }

    let present: Vec<String> = data
        .rows
        .iter()
        .filter_map(|row| row.get(index))
        .filter(|v| !v.is_null())
        .map(Value::to_display_string)
        .collect();
    ColumnSummary {
        name,
        count: present.len(),
        distinct: present.iter().collect::<HashSet<_>>().len(),
        mean: None,
        min: None,
        max: None,
    }
}
