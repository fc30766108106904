//! Command output types and their text rendering.
//!
//! Handlers return `CommandOutput` values; the REPL and the one-shot CLI
//! turn them into text with [`CommandOutput::render`].

use tabled::{builder::Builder, settings::Style};

use crate::db::QueryResult;

/// Output from a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Informational message (success, status, etc.).
    Info(String),

    /// Error message.
    Error(String),

    /// Structured table data for display.
    Table {
        /// Column headers.
        headers: Vec<String>,
        /// Row data (each row is a vector of cell values).
        rows: Vec<Vec<String>>,
    },

    /// Pre-formatted text printed as is (schema listings, charts).
    Text(String),

    /// Multiple outputs, printed in order.
    Multiple(Vec<CommandOutput>),

    /// Leave the REPL.
    Exit,
}

impl CommandOutput {
    /// Creates an info message.
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    /// Creates an error message.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    /// Creates an error message from a crate error.
    pub fn from_error(error: &crate::error::ParleyError) -> Self {
        Self::Error(error.to_string())
    }

    /// Creates a table output from a query result.
    pub fn from_result(result: &QueryResult) -> Self {
        Self::Table {
            headers: result.columns.iter().map(|c| c.name.clone()).collect(),
            rows: result
                .rows
                .iter()
                .map(|row| row.iter().map(|v| v.to_display_string()).collect())
                .collect(),
        }
    }

    pub fn is_exit(&self) -> bool {
        match self {
            Self::Exit => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_exit),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            Self::Error(_) => true,
            Self::Multiple(outputs) => outputs.iter().any(Self::is_error),
            _ => false,
        }
    }

    /// Renders the output as terminal text (no trailing newline).
    pub fn render(&self) -> String {
        match self {
            Self::Info(msg) | Self::Error(msg) => msg.clone(),
            Self::Table { headers, rows } => render_table(headers, rows),
            Self::Text(text) => text.trim_end().to_string(),
            Self::Multiple(outputs) => outputs
                .iter()
                .map(Self::render)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Exit => String::new(),
        }
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return "(no columns)".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    let noun = if rows.len() == 1 { "row" } else { "rows" };
    format!("{table}\n({} {noun})", rows.len())
}
