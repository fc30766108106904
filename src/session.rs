//! Per-session state.
//!
//! Created when the REPL or a one-shot run starts and dropped when it ends.

use crate::db::QueryResult;
use crate::history::QueryHistory;
use crate::llm::Temperature;

/// Which view the query screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// New requests are accepted.
    #[default]
    Query,
    /// Past results are shown; new requests are suspended.
    History,
}

/// State owned by one interactive session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub history: QueryHistory,
    pub view_mode: ViewMode,
    pub temperature: Temperature,
    pub admin_authenticated: bool,
    /// Result of the latest successful request, for export.
    pub last_result: Option<QueryResult>,
}

impl Session {
    /// Creates a session with the given history capacity and temperature.
    pub fn new(history_capacity: usize, temperature: Temperature) -> Self {
        Self {
            history: QueryHistory::with_capacity(history_capacity),
            temperature,
            ..Self::default()
        }
    }

    /// Flips between the query and history views. Returns the new mode.
    pub fn toggle_view(&mut self) -> ViewMode {
        self.view_mode = match self.view_mode {
            ViewMode::Query => ViewMode::History,
            ViewMode::History => ViewMode::Query,
        };
        self.view_mode
    }

    pub fn is_history_view(&self) -> bool {
        self.view_mode == ViewMode::History
    }

    /// Records a successful request and remembers its result for export.
    pub fn record_success(&mut self, question: &str, sql: &str, result: &QueryResult) {
        self.history.record(question, sql, result.clone());
        self.last_result = Some(result.clone());
    }

    /// Checks the placeholder admin password. With no password configured
    /// the gate is open.
    pub fn login(&mut self, configured: Option<&str>, attempt: &str) -> bool {
        self.admin_authenticated = match configured {
            Some(password) => password == attempt,
            None => true,
        };
        self.admin_authenticated
    }

    pub fn logout(&mut self) {
        self.admin_authenticated = false;
    }

    /// Whether admin-only commands may run.
    pub fn admin_allowed(&self, configured: Option<&str>) -> bool {
        configured.is_none() || self.admin_authenticated
    }
}
