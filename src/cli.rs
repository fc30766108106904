//! Command-line argument parsing for Parley.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, STORE_VAR};
use crate::error::Result;
use crate::llm::Temperature;

/// Ask questions about your spreadsheets in plain English.
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite store file
    #[arg(short = 's', long, value_name = "PATH", env = STORE_VAR)]
    pub store: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Completion provider (azure or mock)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short = 't', long, value_name = "VALUE")]
    pub temperature: Option<f32>,

    /// Maximum history entries kept per session (0 = unbounded)
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,

    /// Answer one question, print the result and exit
    #[arg(short = 'a', long, value_name = "QUESTION", conflicts_with = "import")]
    pub ask: Option<String>,

    /// With --ask, also write the result as CSV to this path
    #[arg(short = 'o', long, value_name = "PATH", requires = "ask")]
    pub export: Option<PathBuf>,

    /// Import files into the store and exit
    #[arg(short = 'i', long, value_name = "FILE", num_args = 1..)]
    pub import: Vec<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Whether the run answers or imports once instead of starting the REPL.
    pub fn is_one_shot(&self) -> bool {
        self.ask.is_some() || !self.import.is_empty()
    }

    /// Applies flag overrides on top of file configuration.
    ///
    /// `--store` (or `PARLEY_STORE`, which clap reads into the same flag)
    /// wins over the `[store] path` setting.
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
        if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = Temperature::new(temperature)?.value();
        }
        if let Some(limit) = self.history_limit {
            config.history.max_entries = limit;
        }
        Ok(())
    }
}
