//! Query execution behind the read-only guard.
//!
//! Provides isolated query execution that can be tested independently
//! of the full orchestrator.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::db::{DatabaseClient, QueryResult};
use crate::error::ParleyError;
use crate::safety::{check_read_only, refusal_error, ClassificationResult, GuardVerdict};

/// Query executor that guards and executes SQL.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Classifies and, when read-only, executes a query.
    ///
    /// Never fails past this boundary: rejections and store errors come
    /// back as values.
    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        match check_read_only(sql) {
            GuardVerdict::Allowed(_) => {}
            GuardVerdict::Refused => return ExecutionResult::Error(refusal_error()),
            GuardVerdict::Rejected(classification) => {
                warn!(
                    level = %classification.level,
                    statement = %classification.statement_type,
                    "Refusing to execute SQL"
                );
                return ExecutionResult::Rejected {
                    sql: sql.to_string(),
                    classification,
                };
            }
        }

        let start = Instant::now();
        match self.db.execute_query(sql).await {
            Ok(result) => {
                let execution_time = start.elapsed();
                debug!(rows = result.row_count(), ?execution_time, "Query executed");
                ExecutionResult::Success(QueryOutcome {
                    result,
                    execution_time,
                })
            }
            Err(e) => ExecutionResult::Error(e),
        }
    }
}

/// Result of executing a query.
#[derive(Debug)]
pub enum ExecutionResult {
    /// Query executed successfully.
    Success(QueryOutcome),
    /// The guard refused the statement; nothing ran.
    Rejected {
        sql: String,
        classification: ClassificationResult,
    },
    /// Query execution failed.
    Error(ParleyError),
}

impl ExecutionResult {
    /// Converts into a plain `Result`, turning a rejection into a query error.
    pub fn into_result(self) -> crate::error::Result<QueryOutcome> {
        match self {
            Self::Success(outcome) => Ok(outcome),
            Self::Rejected { classification, .. } => {
                Err(ParleyError::query(classification.rejection_reason()))
            }
            Self::Error(e) => Err(e),
        }
    }
}

/// Successful query execution outcome.
#[derive(Debug)]
pub struct QueryOutcome {
    /// The query result.
    pub result: QueryResult,
    /// Wall time including the round trip to the store.
    pub execution_time: Duration,
}
