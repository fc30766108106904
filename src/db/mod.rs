//! Store abstraction layer for Parley.
//!
//! Provides a trait-based interface for store operations so the query
//! pipeline can run against SQLite or an in-memory double.

mod mock;
mod schema;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use schema::{Column, Schema, Table};
pub use sqlite::{OpenMode, SqliteStore};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for store clients.
///
/// All operations are async and return Results with ParleyError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the store schema. Never cached: every call reads the
    /// catalog again.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Lists user table names in store enumeration order.
    async fn list_tables(&self) -> Result<Vec<String>> {
        let schema = self.introspect_schema().await?;
        Ok(schema.tables.into_iter().map(|t| t.name).collect())
    }

    /// Closes the store connection.
    async fn close(&self) -> Result<()>;
}

/// Quotes an identifier for SQLite, doubling embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
