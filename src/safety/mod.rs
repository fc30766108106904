//! Read-only guard for generated and typed SQL.
//!
//! Parses SQL and classifies it as safe, mutating or destructive. Only a
//! single safe statement may reach the store; everything else is rejected
//! before execution.

mod parser;

pub use parser::{
    check_read_only, classify_sql, classify_unparsed, ensure_read_only, refusal_error,
    GuardVerdict, SqlClassifier,
};

use std::fmt;

/// Safety level classification for SQL queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Read-only queries (SELECT, WITH ... SELECT, VALUES, EXPLAIN of those).
    Safe,
    /// Data modification (INSERT, UPDATE, MERGE).
    Mutating,
    /// Data loss, schema or connection changes (DELETE, DROP, ALTER,
    /// CREATE, PRAGMA, ATTACH) and anything unrecognized.
    Destructive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Explain,
    Merge,
    Pragma,
    Attach,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement type could not be determined.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Merge => write!(f, "MERGE"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    /// The determined safety level.
    pub level: SafetyLevel,
    /// The type of statement(s) detected.
    pub statement_type: StatementType,
    /// Optional explanation shown to the user.
    pub warning: Option<String>,
}

impl ClassificationResult {
    /// Creates a new classification result.
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            warning: None,
        }
    }

    /// Creates a classification result with a warning message.
    pub fn with_warning(
        level: SafetyLevel,
        statement_type: StatementType,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            warning: Some(warning.into()),
        }
    }

    /// Returns true if this is exactly one read-only statement.
    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::Safe && !matches!(self.statement_type, StatementType::Multiple(_))
    }

    /// Human-readable reason the statement may not run.
    pub fn rejection_reason(&self) -> String {
        if let Some(warning) = &self.warning {
            return warning.clone();
        }
        match &self.statement_type {
            StatementType::Multiple(_) => {
                "Only a single SELECT statement may be run at a time.".to_string()
            }
            other => format!("Only read-only SELECT queries are allowed (got {other})."),
        }
    }
}
