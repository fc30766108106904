//! Command handlers for Parley.
//!
//! Each handler takes a command context and returns a [`CommandOutput`].

pub mod admin;
pub mod history;
pub mod query;
pub mod system;
pub mod visualize;

use super::output::CommandOutput;
use super::router::Command;
use crate::app::Orchestrator;
use crate::session::Session;

/// Context provided to command handlers.
pub struct CommandContext<'a> {
    /// Pipeline and store location.
    pub orchestrator: &'a Orchestrator,
    /// The session the command runs in.
    pub session: &'a mut Session,
    /// Configured admin password; `None` leaves data commands open.
    pub admin_password: Option<&'a str>,
}

/// Runs one parsed command to completion.
pub async fn dispatch(ctx: &mut CommandContext<'_>, command: Command) -> CommandOutput {
    match command {
        Command::Help => system::handle_help(),
        Command::Quit => system::handle_quit(),
        Command::Schema => system::handle_schema(ctx).await,
        Command::Tables => system::handle_tables(ctx).await,
        Command::History => history::handle_toggle(ctx),
        Command::Query => history::handle_query_view(ctx),
        Command::Temperature(value) => query::handle_temperature(ctx, value.as_deref()),
        Command::Export(path) => query::handle_export(ctx, path.as_deref()),
        Command::Sql(sql) => query::handle_sql(ctx, &sql).await,
        Command::NaturalLanguage(question) => query::handle_question(ctx, &question).await,
        Command::Import(paths) => admin::handle_import(ctx, &paths).await,
        Command::Drop(table) => admin::handle_drop(ctx, &table).await,
        Command::Login(password) => admin::handle_login(ctx, &password),
        Command::Logout => admin::handle_logout(ctx),
        Command::Visualize(args) => visualize::handle_visualize(ctx, &args).await,
        Command::Invalid { usage } => CommandOutput::error(usage),
        Command::Unknown(command) => system::handle_unknown(&command),
    }
}
