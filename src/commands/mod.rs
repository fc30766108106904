//! Command parsing and dispatch for Parley.
//!
//! Parsing is kept apart from execution so commands can be unit tested
//! without a store.

pub mod handlers;
pub mod help;
pub mod output;
pub mod router;
pub mod tokenizer;

pub use handlers::{dispatch, CommandContext};
pub use output::CommandOutput;
pub use router::{Command, CommandRouter, VisualizeArgs};
