//! Store schema types for Parley.
//!
//! Represents the user tables of the store and their declared columns, and
//! renders them into the compact summary embedded in completion prompts.

use serde::{Deserialize, Serialize};

/// Represents the user-visible schema of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// User tables in store enumeration order.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the store has no user tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Looks up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Formats the schema for inclusion in a completion prompt.
    ///
    /// Each table renders as a `Table:` line followed by a `Columns:` line
    /// listing `name (TYPE)` pairs in declaration order. Tables are separated
    /// by a blank line. An empty schema yields an empty string.
    pub fn format_for_llm(&self) -> String {
        self.tables
            .iter()
            .map(Table::format_for_llm)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Formats the schema for display in the REPL.
    pub fn format_for_display(&self) -> String {
        if self.tables.is_empty() {
            return "No tables in the store. Use /import <file> to load data.".to_string();
        }
        self.format_for_llm()
    }
}

/// Represents a table in the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    fn format_for_llm(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.data_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Table: {}\nColumns: {}", self.name, columns)
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type as written in the DDL (may be empty in SQLite).
    pub data_type: String,
}

impl Column {
    /// Creates a new column with the given name and declared type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}
