//! Mock store clients for testing.
//!
//! Provides in-memory implementations used by executor and pipeline tests
//! that don't need a real SQLite file.

use super::{DatabaseClient, QueryResult, Schema};
use crate::error::{ParleyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A mock store client that returns predefined results.
#[derive(Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    results: HashMap<String, QueryResult>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Registers the result returned for an exact SQL string.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }

    /// Returns every SQL string passed to `execute_query`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }
        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| ParleyError::query(format!("no such table in mock for: {sql}")))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A store client whose every operation fails with a store error.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Err(ParleyError::store(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ParleyError::store(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
