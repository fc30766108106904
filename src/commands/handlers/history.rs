//! History view handlers (/history, /query).

use std::time::SystemTime;

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::session::ViewMode;

/// Handle /history command: toggles the view and lists past results when
/// the history view opens.
pub fn handle_toggle(ctx: &mut CommandContext<'_>) -> CommandOutput {
    match ctx.session.toggle_view() {
        ViewMode::History => history_listing(ctx),
        ViewMode::Query => CommandOutput::info(QUERY_VIEW),
    }
}

/// Handle /query command.
pub fn handle_query_view(ctx: &mut CommandContext<'_>) -> CommandOutput {
    ctx.session.view_mode = ViewMode::Query;
    CommandOutput::info(QUERY_VIEW)
}

fn history_listing(ctx: &CommandContext<'_>) -> CommandOutput {
    let history = &ctx.session.history;
    let mut outputs = vec![CommandOutput::info(
        "History view. New questions are paused; use /query or /history to return.",
    )];

    if history.is_empty() {
        outputs.push(CommandOutput::info("No queries yet."));
        return CommandOutput::Multiple(outputs);
    }

    let now = SystemTime::now();
    let total = history.len();
    for (i, record) in history.iter_recent_first().enumerate() {
        let age = now
            .duration_since(record.recorded_at)
            .map(|d| format_age(d.as_secs()))
            .unwrap_or_else(|_| "just now".to_string());
        outputs.push(CommandOutput::info(format!(
            "\n#{} ({age}) {}\nSQL: {}",
            total - i,
            record.question,
            record.sql
        )));
        outputs.push(CommandOutput::from_result(&record.result));
    }

    CommandOutput::Multiple(outputs)
}

fn format_age(secs: u64) -> String {
    match secs {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        _ => format!("{}h ago", secs / 3600),
    }
}

const QUERY_VIEW: &str = "Query view. Ask a question or type /help.";
