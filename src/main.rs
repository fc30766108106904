//! db-parley - ask questions of your spreadsheets in plain language.

use std::path::Path;

use db_parley::app::{Orchestrator, PipelineOutcome};
use db_parley::cli::Cli;
use db_parley::commands::handlers::query::render_outcome;
use db_parley::config::{AzureCredentials, Config};
use db_parley::db::{DatabaseClient, SqliteStore};
use db_parley::error::{ParleyError, Result};
use db_parley::export::write_csv;
use db_parley::import::import_file;
use db_parley::llm::LlmProvider;
use db_parley::logging;
use db_parley::repl::Repl;
use db_parley::session::Session;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads PARLEY_STORE
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: could not load .env: {e}");
        }
    }

    let cli = Cli::parse_args();
    let interactive = !cli.is_one_shot();
    if interactive {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        if interactive {
            eprintln!("{}: {}", e.category(), e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();
    cli.apply_to(&mut config)?;
    config.validate()?;

    if !cli.import.is_empty() {
        return import_files(&config, &cli.import).await;
    }

    let credentials = load_credentials(&config)?;

    match &cli.ask {
        Some(question) => ask_once(&config, credentials, question, cli.export.as_deref()).await,
        None => {
            let mut repl = Repl::from_config(&config, credentials)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl.run(stdin, &mut stdout).await
        }
    }
}

/// Reads completion credentials once, up front, when the provider needs them.
fn load_credentials(config: &Config) -> Result<Option<AzureCredentials>> {
    match config.provider()? {
        LlmProvider::Azure => AzureCredentials::from_env().map(Some),
        LlmProvider::Mock => Ok(None),
    }
}

async fn ask_once(
    config: &Config,
    credentials: Option<AzureCredentials>,
    question: &str,
    export: Option<&Path>,
) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config, credentials)?;
    let mut session = Session::new(config.history.max_entries, config.temperature()?);

    let outcome = orchestrator.ask(&mut session, question).await;
    if let (PipelineOutcome::Success { result, .. }, Some(target)) = (&outcome, export) {
        let written = write_csv(result, target)?;
        info!(path = %written.display(), "Wrote CSV");
    }

    match outcome {
        PipelineOutcome::Failed { sql, error } => {
            if let Some(sql) = sql {
                println!("SQL: {sql}");
            }
            Err(error)
        }
        success => {
            println!("{}", render_outcome(success).render());
            Ok(())
        }
    }
}

async fn import_files(config: &Config, paths: &[std::path::PathBuf]) -> Result<()> {
    let store = SqliteStore::open_read_write(&config.store.path).await?;

    let mut failed = 0;
    for path in paths {
        match import_file(&store, path).await {
            Ok(tables) => {
                for table in tables {
                    println!(
                        "Imported {} ({} rows, {} columns) from {}",
                        table.name,
                        table.row_count,
                        table.columns.len(),
                        path.display()
                    );
                }
            }
            Err(e) => {
                failed += 1;
                error!("{}: {}", e.category(), e);
            }
        }
    }

    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close store");
    }

    if failed > 0 {
        return Err(ParleyError::import(format!(
            "{failed} of {} files could not be imported",
            paths.len()
        )));
    }
    Ok(())
}
