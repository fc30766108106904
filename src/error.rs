//! Error types for Parley.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Store errors (file missing, locked, corrupt, introspection failed).
    #[error("Store error: {0}")]
    Store(String),

    /// Query errors (syntax errors, unknown tables, rejected statements, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (auth, rate limits, transport, malformed responses).
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, missing credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File import errors (unreadable file, unsupported format, etc.)
    #[error("Import error: {0}")]
    Import(String),

    /// Result export errors.
    #[error("Export error: {0}")]
    Export(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Creates a store error with the given message.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an import error with the given message.
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Store(_) => "Store Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Import(_) => "Import Error",
            Self::Export(_) => "Export Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ParleyError.
pub type Result<T> = std::result::Result<T, ParleyError>;
