//! db-parley - ask questions of your spreadsheets in plain language.
//!
//! Imported CSV and workbook files live in a local SQLite store. A language
//! model turns each question into SQL, a guard makes sure only read-only
//! statements run, and results are shown, kept in a session history and
//! exported as CSV.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod llm;
pub mod logging;
pub mod query;
pub mod repl;
pub mod safety;
pub mod session;
pub mod visualize;
