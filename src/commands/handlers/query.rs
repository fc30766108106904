//! Query command handlers (natural language, /sql, /export, /temperature).

use std::path::Path;

use super::CommandContext;
use crate::app::PipelineOutcome;
use crate::commands::output::CommandOutput;
use crate::export::write_csv;
use crate::llm::Temperature;

/// Handle a natural-language request.
pub async fn handle_question(ctx: &mut CommandContext<'_>, question: &str) -> CommandOutput {
    let outcome = ctx.orchestrator.ask(ctx.session, question).await;
    render_outcome(outcome)
}

/// Handle /sql command.
pub async fn handle_sql(ctx: &mut CommandContext<'_>, sql: &str) -> CommandOutput {
    let outcome = ctx.orchestrator.run_sql(ctx.session, sql).await;
    render_outcome(outcome)
}

/// Shows the SQL that ran (or was refused) followed by the result or error.
pub fn render_outcome(outcome: PipelineOutcome) -> CommandOutput {
    match outcome {
        PipelineOutcome::Success { sql, result } => CommandOutput::Multiple(vec![
            CommandOutput::info(format!("SQL: {sql}")),
            CommandOutput::from_result(&result),
            CommandOutput::info(format!("Query took {:.1?}", result.execution_time)),
        ]),
        PipelineOutcome::Failed { sql, error } => {
            let mut outputs = Vec::new();
            if let Some(sql) = sql {
                outputs.push(CommandOutput::info(format!("SQL: {sql}")));
            }
            outputs.push(CommandOutput::from_error(&error));
            CommandOutput::Multiple(outputs)
        }
    }
}

/// Handle /export command. Without a path the file lands in the working
/// directory.
pub fn handle_export(ctx: &CommandContext<'_>, path: Option<&str>) -> CommandOutput {
    let Some(result) = ctx.session.last_result.as_ref() else {
        return CommandOutput::error("Nothing to export yet. Run a query first.");
    };

    match write_csv(result, Path::new(path.unwrap_or("."))) {
        Ok(written) => CommandOutput::info(format!(
            "Exported {} rows to {}",
            result.row_count(),
            written.display()
        )),
        Err(e) => CommandOutput::from_error(&e),
    }
}

/// Handle /temperature command.
pub fn handle_temperature(ctx: &mut CommandContext<'_>, value: Option<&str>) -> CommandOutput {
    let Some(value) = value else {
        return CommandOutput::info(format!("Temperature: {}", ctx.session.temperature));
    };

    match value.parse::<Temperature>() {
        Ok(temperature) => {
            ctx.session.temperature = temperature;
            CommandOutput::info(format!("Temperature set to {temperature}"))
        }
        Err(e) => CommandOutput::from_error(&e),
    }
}
