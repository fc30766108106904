//! Integration tests for db-parley.

pub mod common;
pub mod export_test;
pub mod guard_test;
pub mod import_test;
pub mod pipeline_test;
pub mod repl_test;
pub mod visualize_test;
