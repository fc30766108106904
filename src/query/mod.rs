//! Query execution for Parley.
//!
//! This module isolates SQL guarding and execution from the main
//! orchestrator.

pub mod executor;

pub use executor::{ExecutionResult, QueryExecutor, QueryOutcome};
