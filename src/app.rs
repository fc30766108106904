//! Core orchestrator for Parley.
//!
//! Coordinates the store, the completion client, the read-only guard and
//! the session to answer one natural-language request at a time.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{AzureCredentials, Config};
use crate::db::{DatabaseClient, QueryResult, Schema, SqliteStore};
use crate::error::{ParleyError, Result};
use crate::llm::{build_messages, create_client, sanitize_sql, LlmClient, MockLlmClient};
use crate::query::QueryExecutor;
use crate::session::Session;

/// Result of one pass through the query pipeline.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The SQL ran and the result was recorded in the session history.
    Success { sql: String, result: QueryResult },
    /// Something failed. `sql` is set when generation got that far.
    Failed {
        sql: Option<String>,
        error: ParleyError,
    },
}

impl PipelineOutcome {
    fn failed(sql: Option<String>, error: ParleyError) -> Self {
        Self::Failed { sql, error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The generated SQL, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Success { sql, .. } => Some(sql),
            Self::Failed { sql, .. } => sql.as_deref(),
        }
    }
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    /// LLM client for generating SQL from natural language.
    llm: Box<dyn LlmClient>,
    /// Store file, opened read-only per request.
    store_path: PathBuf,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given components.
    pub fn new(llm: Box<dyn LlmClient>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            store_path: store_path.into(),
        }
    }

    /// Creates an orchestrator from configuration.
    pub fn from_config(config: &Config, credentials: Option<AzureCredentials>) -> Result<Self> {
        let llm = create_client(config.provider()?, config, credentials)?;
        Ok(Self::new(llm, &config.store.path))
    }

    /// Creates an orchestrator with a mock LLM for testing.
    pub fn with_mock_llm(store_path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(MockLlmClient::new()), store_path)
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Opens the store read-only.
    pub async fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open_read_only(&self.store_path).await
    }

    /// Reads the current schema from the store.
    pub async fn schema(&self) -> Result<Schema> {
        let store = self.open_store().await?;
        let schema = store.introspect_schema().await;
        close_quietly(&store).await;
        schema
    }

    /// Answers a natural-language request against the store.
    pub async fn ask(&self, session: &mut Session, question: &str) -> PipelineOutcome {
        if let Err(e) = check_accepting(session, question) {
            return PipelineOutcome::failed(None, e);
        }

        let store = match self.open_store().await {
            Ok(store) => store,
            Err(e) => return PipelineOutcome::failed(None, e),
        };
        let outcome = self.ask_with(&store, session, question).await;
        close_quietly(&store).await;
        outcome
    }

    /// Runs the pipeline against an already-open store.
    pub async fn ask_with(
        &self,
        db: &dyn DatabaseClient,
        session: &mut Session,
        question: &str,
    ) -> PipelineOutcome {
        if let Err(e) = check_accepting(session, question) {
            return PipelineOutcome::failed(None, e);
        }
        let question = question.trim();

        // Schema is read fresh for every request
        let schema = match db.introspect_schema().await {
            Ok(schema) => schema,
            Err(e) => return PipelineOutcome::failed(None, e),
        };

        let messages = build_messages(&schema.format_for_llm(), question);
        debug!(tables = schema.tables.len(), "Prompt built");

        let reply = match self.llm.complete(&messages, session.temperature).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Completion failed");
                return PipelineOutcome::failed(None, e);
            }
        };

        let sql = sanitize_sql(&reply);
        info!(sql = %sql, "Generated SQL");

        execute_and_record(db, session, question, sql).await
    }

    /// Runs user-typed SQL through the same guard, without a model call.
    pub async fn run_sql(&self, session: &mut Session, sql: &str) -> PipelineOutcome {
        if let Err(e) = check_query_view(session) {
            return PipelineOutcome::failed(None, e);
        }

        let store = match self.open_store().await {
            Ok(store) => store,
            Err(e) => return PipelineOutcome::failed(None, e),
        };
        let outcome = Self::run_sql_with(&store, session, sql).await;
        close_quietly(&store).await;
        outcome
    }

    /// Runs user-typed SQL against an already-open store.
    pub async fn run_sql_with(
        db: &dyn DatabaseClient,
        session: &mut Session,
        sql: &str,
    ) -> PipelineOutcome {
        if let Err(e) = check_query_view(session) {
            return PipelineOutcome::failed(None, e);
        }
        let sql = sql.trim();
        if sql.is_empty() {
            return PipelineOutcome::failed(None, ParleyError::query("Usage: /sql <query>"));
        }
        execute_and_record(db, session, sql, sql.to_string()).await
    }
}

/// Refuses new requests while the history view is open.
fn check_query_view(session: &Session) -> Result<()> {
    if session.is_history_view() {
        return Err(ParleyError::query(
            "History view is open. Use /query to ask new questions.",
        ));
    }
    Ok(())
}

/// Refuses new requests while the history view is open or the text is blank.
fn check_accepting(session: &Session, question: &str) -> Result<()> {
    check_query_view(session)?;
    if question.trim().is_empty() {
        return Err(ParleyError::query("Please enter a question."));
    }
    Ok(())
}

async fn execute_and_record(
    db: &dyn DatabaseClient,
    session: &mut Session,
    question: &str,
    sql: String,
) -> PipelineOutcome {
    match QueryExecutor::new(db).execute(&sql).await.into_result() {
        Ok(outcome) => {
            let result = outcome.result.with_execution_time(outcome.execution_time);
            session.record_success(question, &sql, &result);
            info!(rows = result.row_count(), "Request answered");
            PipelineOutcome::Success { sql, result }
        }
        Err(e) => PipelineOutcome::failed(Some(sql), e),
    }
}

async fn close_quietly(db: &dyn DatabaseClient) {
    if let Err(e) = db.close().await {
        warn!(error = %e, "Failed to close store");
    }
}
