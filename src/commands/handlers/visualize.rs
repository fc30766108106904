//! /visualize handler.

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::commands::router::VisualizeArgs;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::visualize::{
    profile_table, render_plans, ChartKind, ColumnSummary, TableProfile, DEFAULT_HEIGHT,
    DEFAULT_WIDTH, PREVIEW_ROWS,
};

/// Handle /visualize: preview, column summaries, suggested pairs, then charts.
pub async fn handle_visualize(ctx: &CommandContext<'_>, args: &VisualizeArgs) -> CommandOutput {
    let kind = match args.kind.as_deref().map(str::parse::<ChartKind>).transpose() {
        Ok(kind) => kind.unwrap_or_default(),
        Err(e) => return CommandOutput::from_error(&e),
    };

    let profile = match load_profile(ctx, &args.table).await {
        Ok(profile) => profile,
        Err(e) => return CommandOutput::from_error(&e),
    };

    let pair = args.pair.as_ref().map(|(x, y)| (x.as_str(), y.as_str()));
    let plans = match profile.plan_charts(pair, kind) {
        Ok(plans) => plans,
        Err(e) => return CommandOutput::from_error(&e),
    };

    let mut outputs = vec![
        CommandOutput::info(format!(
            "{} ({} rows). First {PREVIEW_ROWS}:",
            profile.table,
            profile.data.row_count()
        )),
        CommandOutput::from_result(&profile.preview()),
        summary_table(&profile.summaries),
        suggestions(&profile),
    ];

    if plans.is_empty() {
        outputs.push(CommandOutput::info(
            "No numeric columns suitable for charting.",
        ));
    } else {
        outputs.push(CommandOutput::Text(render_plans(
            &plans,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
        )));
    }

    CommandOutput::Multiple(outputs)
}

async fn load_profile(ctx: &CommandContext<'_>, table: &str) -> Result<TableProfile> {
    let store = ctx.orchestrator.open_store().await?;
    let profile = profile_table(&store, table).await;
    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Failed to close store");
    }
    profile
}

fn summary_table(summaries: &[ColumnSummary]) -> CommandOutput {
    let number = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_default();
    CommandOutput::Table {
        headers: ["column", "count", "distinct", "mean", "min", "max"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: summaries
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.count.to_string(),
                    s.distinct.to_string(),
                    number(s.mean),
                    number(s.min),
                    number(s.max),
                ]
            })
            .collect(),
    }
}

fn suggestions(profile: &TableProfile) -> CommandOutput {
    if profile.suggested_pairs.is_empty() {
        return CommandOutput::info("No correlated column pairs found.");
    }
    let pairs = profile
        .suggested_pairs
        .iter()
        .map(|(x, y)| format!("{x} {y}"))
        .collect::<Vec<_>>()
        .join(", ");
    CommandOutput::info(format!("Suggested pairs: {pairs}"))
}
