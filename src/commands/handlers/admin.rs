//! Data management handlers (/import, /drop, /login, /logout).
//!
//! Import and drop open the store read-write for the duration of the
//! command; everything else in the session only ever reads it.

use std::path::Path;

use tracing::{info, warn};

use super::CommandContext;
use crate::commands::output::CommandOutput;
use crate::db::{DatabaseClient, SqliteStore};
use crate::import::import_file;

const LOGIN_REQUIRED: &str = "Admin login required. Use /login <password> first.";

/// Handle /login command.
pub fn handle_login(ctx: &mut CommandContext<'_>, password: &str) -> CommandOutput {
    if ctx.admin_password.is_none() {
        ctx.session.login(None, password);
        return CommandOutput::info("No admin password is configured; data commands are open.");
    }

    if ctx.session.login(ctx.admin_password, password) {
        info!("Admin login succeeded");
        CommandOutput::info("Logged in. /import and /drop are available.")
    } else {
        warn!("Admin login failed");
        CommandOutput::error("Incorrect password.")
    }
}

/// Handle /logout command.
pub fn handle_logout(ctx: &mut CommandContext<'_>) -> CommandOutput {
    ctx.session.logout();
    CommandOutput::info("Logged out.")
}

/// Handle /import command. Each file is imported independently; one bad
/// file does not stop the rest.
pub async fn handle_import(ctx: &mut CommandContext<'_>, paths: &[String]) -> CommandOutput {
    if !ctx.session.admin_allowed(ctx.admin_password) {
        return CommandOutput::error(LOGIN_REQUIRED);
    }

    let store = match SqliteStore::open_read_write(ctx.orchestrator.store_path()).await {
        Ok(store) => store,
        Err(e) => return CommandOutput::from_error(&e),
    };

    let mut outputs = Vec::with_capacity(paths.len());
    for path in paths {
        match import_file(&store, Path::new(path)).await {
            Ok(tables) if tables.is_empty() => {
                outputs.push(CommandOutput::info(format!("{path}: no data found")));
            }
            Ok(tables) => {
                for table in tables {
                    outputs.push(CommandOutput::info(format!(
                        "Imported {} ({} rows, {} columns) from {path}",
                        table.name,
                        table.row_count,
                        table.columns.len()
                    )));
                }
            }
            Err(e) => outputs.push(CommandOutput::from_error(&e)),
        }
    }

    close_store(&store).await;
    CommandOutput::Multiple(outputs)
}

/// Handle /drop command.
pub async fn handle_drop(ctx: &mut CommandContext<'_>, table: &str) -> CommandOutput {
    if !ctx.session.admin_allowed(ctx.admin_password) {
        return CommandOutput::error(LOGIN_REQUIRED);
    }

    let store = match SqliteStore::open_read_write(ctx.orchestrator.store_path()).await {
        Ok(store) => store,
        Err(e) => return CommandOutput::from_error(&e),
    };

    let output = match store.drop_table(table).await {
        Ok(true) => CommandOutput::info(format!("Dropped table {table}")),
        Ok(false) => CommandOutput::error(format!(
            "Unknown table: {table}. Use /tables to list tables."
        )),
        Err(e) => CommandOutput::from_error(&e),
    };

    close_store(&store).await;
    output
}

async fn close_store(store: &SqliteStore) {
    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close store");
    }
}
