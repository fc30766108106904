//! Interactive read-eval-print loop.
//!
//! Reads one line at a time, runs it to completion, prints the output and
//! only then reads the next line.

use std::io::{ErrorKind, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::app::Orchestrator;
use crate::commands::{dispatch, CommandContext, CommandOutput, CommandRouter};
use crate::config::{AzureCredentials, Config};
use crate::error::{ParleyError, Result};
use crate::session::Session;

const INVALID_INPUT: &str = "Input was not valid UTF-8; line ignored.";

/// One interactive session.
pub struct Repl {
    orchestrator: Orchestrator,
    session: Session,
    admin_password: Option<String>,
}

impl Repl {
    pub fn new(
        orchestrator: Orchestrator,
        session: Session,
        admin_password: Option<String>,
    ) -> Self {
        Self {
            orchestrator,
            session,
            admin_password,
        }
    }

    /// Builds the orchestrator and a fresh session from configuration.
    pub fn from_config(config: &Config, credentials: Option<AzureCredentials>) -> Result<Self> {
        let orchestrator = Orchestrator::from_config(config, credentials)?;
        let session = Session::new(config.history.max_entries, config.temperature()?);
        Ok(Self::new(
            orchestrator,
            session,
            config.admin.password.clone(),
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Parses and runs one input line.
    pub async fn execute_line(&mut self, line: &str) -> CommandOutput {
        let command = CommandRouter::parse(line);
        debug!(?command, "Dispatching command");

        let mut ctx = CommandContext {
            orchestrator: &self.orchestrator,
            session: &mut self.session,
            admin_password: self.admin_password.as_deref(),
        };
        dispatch(&mut ctx, command).await
    }

    fn prompt(&self) -> &'static str {
        if self.session.is_history_view() {
            "parley[history]> "
        } else {
            "parley> "
        }
    }

    /// Runs until `/quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let io_err = |e: std::io::Error| ParleyError::internal(format!("Terminal I/O failed: {e}"));

        writeln!(
            out,
            "db-parley {}. Store: {}. Type /help for commands.",
            env!("CARGO_PKG_VERSION"),
            self.orchestrator.store_path().display()
        )
        .map_err(io_err)?;
        info!(store = %self.orchestrator.store_path().display(), "Session started");

        let mut lines = input.lines();
        loop {
            write!(out, "{}", self.prompt()).map_err(io_err)?;
            out.flush().map_err(io_err)?;

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    writeln!(out).map_err(io_err)?;
                    break;
                }
                // The bad line is already consumed; keep the session going
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    warn!(error = %e, "Skipping unreadable input line");
                    writeln!(out, "{}", CommandOutput::error(INVALID_INPUT).render())
                        .map_err(io_err)?;
                    continue;
                }
                Err(e) => return Err(io_err(e)),
            };

            // Blank lines at the prompt are not requests
            if line.trim().is_empty() {
                continue;
            }

            let output = self.execute_line(&line).await;
            let text = output.render();
            if !text.is_empty() {
                writeln!(out, "{text}").map_err(io_err)?;
            }
            if output.is_exit() {
                break;
            }
        }

        info!(queries = self.session.history.len(), "Session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Column, DatabaseClient, SqliteStore, Value};
    use tempfile::tempdir;

    async fn repl_with_orders(dir: &std::path::Path) -> Repl {
        let path = dir.join("store.sqlite");
        let store = SqliteStore::open_read_write(&path).await.unwrap();
        store
            .replace_table(
                "orders",
                &[Column::new("id", "INTEGER"), Column::new("amount", "REAL")],
                &[
                    vec![Value::Int(1), Value::Float(9.5)],
                    vec![Value::Int(2), Value::Float(3.0)],
                ],
            )
            .await
            .unwrap();
        store.close().await.unwrap();

        Repl::new(Orchestrator::with_mock_llm(&path), Session::new(10, Default::default()), None)
    }

    #[tokio::test]
    async fn test_run_answers_question_and_quits() {
        let dir = tempdir().unwrap();
        let mut repl = repl_with_orders(dir.path()).await;
        let input: &[u8] = b"how many orders are there?\n\n/quit\nnever read\n";
        let mut out = Vec::new();

        repl.run(input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Type /help for commands."));
        assert!(text.contains("SQL: SELECT COUNT(*) FROM \"orders\";"));
        assert!(text.contains("(1 row)"));
        assert_eq!(repl.session().history.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let dir = tempdir().unwrap();
        let mut repl = repl_with_orders(dir.path()).await;
        let input: &[u8] = b"/history\n";
        let mut out = Vec::new();

        repl.run(input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No queries yet."));
        assert!(text.ends_with("parley[history]> \n"));
    }

    #[tokio::test]
    async fn test_run_skips_invalid_utf8_line() {
        let dir = tempdir().unwrap();
        let mut repl = repl_with_orders(dir.path()).await;
        let input: &[u8] = b"\xff\xfe orders\n/tables\n/quit\n";
        let mut out = Vec::new();

        repl.run(input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let after = &text[text.find(INVALID_INPUT).unwrap()..];
        assert!(after.contains("orders"));
        assert!(after.contains("(1 row)"));
    }

    #[tokio::test]
    async fn test_history_view_refuses_questions() {
        let dir = tempdir().unwrap();
        let mut repl = repl_with_orders(dir.path()).await;

        repl.execute_line("/history").await;
        let output = repl.execute_line("show all orders").await;

        assert!(output.is_error());
        assert!(output.render().contains("/query"));
        assert!(repl.session().history.is_empty());
    }

    #[tokio::test]
    async fn test_sql_command_guarded() {
        let dir = tempdir().unwrap();
        let mut repl = repl_with_orders(dir.path()).await;

        let output = repl.execute_line("/sql DELETE FROM orders").await;
        assert!(output.is_error());

        let output = repl.execute_line("/sql SELECT amount FROM orders ORDER BY id").await;
        assert!(!output.is_error());
        assert!(output.render().contains("9.5"));
    }
}
