//! System command handlers (/help, /quit, /schema, /tables).

use super::CommandContext;
use crate::commands::help::HELP_TEXT;
use crate::commands::output::CommandOutput;

/// Handle /help command.
pub fn handle_help() -> CommandOutput {
    CommandOutput::Text(HELP_TEXT.to_string())
}

/// Handle /quit or /exit command.
pub fn handle_quit() -> CommandOutput {
    CommandOutput::Exit
}

/// Handle /schema command.
pub async fn handle_schema(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.orchestrator.schema().await {
        Ok(schema) if schema.is_empty() => CommandOutput::info(EMPTY_STORE),
        Ok(schema) => CommandOutput::Text(schema.format_for_display()),
        Err(e) => CommandOutput::from_error(&e),
    }
}

/// Handle /tables command.
pub async fn handle_tables(ctx: &CommandContext<'_>) -> CommandOutput {
    match ctx.orchestrator.schema().await {
        Ok(schema) if schema.is_empty() => CommandOutput::info(EMPTY_STORE),
        Ok(schema) => CommandOutput::Table {
            headers: vec!["table".to_string(), "columns".to_string()],
            rows: schema
                .tables
                .iter()
                .map(|t| vec![t.name.clone(), t.columns.len().to_string()])
                .collect(),
        },
        Err(e) => CommandOutput::from_error(&e),
    }
}

/// Handle unknown command.
pub fn handle_unknown(command: &str) -> CommandOutput {
    CommandOutput::error(format!(
        "Unknown command: {command}. Type /help for available commands."
    ))
}

const EMPTY_STORE: &str = "The store has no tables. Import data first with /import <file>.";
