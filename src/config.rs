//! Configuration management for Parley.
//!
//! Handles loading configuration from TOML files and environment variables:
//! the store location, the completion provider, history capacity and the
//! optional admin password.

use crate::error::{ParleyError, Result};
use crate::llm::{LlmProvider, Temperature};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the completion service API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable holding the completion service endpoint URL.
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";

/// Environment variable holding the completion service API version.
pub const API_VERSION_VAR: &str = "OPENAI_API_VERSION";

/// Environment variable overriding the store path.
pub const STORE_VAR: &str = "PARLEY_STORE";

/// Store file used when nothing else is configured.
pub const DEFAULT_STORE_FILE: &str = "uploaded_db.sqlite";

/// Model identifier sent to the completion service.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Main configuration structure for Parley.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Session history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Admin gate for the importer.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Where the SQLite store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_FILE)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "azure" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model (deployment) name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Default sampling temperature for new sessions.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "azure".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Session history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of records kept per session (0 = unbounded).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Placeholder admin gate for import and drop commands.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// When set, `/import` and `/drop` require `/login <password>` first.
    pub password: Option<String>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-parley")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ParleyError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ParleyError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `PARLEY_STORE` when set.
    pub fn apply_env_defaults(&mut self) {
        if let Ok(path) = std::env::var(STORE_VAR) {
            if !path.trim().is_empty() {
                self.store.path = PathBuf::from(path);
            }
        }
    }

    /// Returns the configured provider.
    pub fn provider(&self) -> Result<LlmProvider> {
        self.llm.provider.parse().map_err(ParleyError::config)
    }

    /// Returns the configured default temperature.
    pub fn temperature(&self) -> Result<Temperature> {
        Temperature::new(self.llm.temperature)
    }

    /// Validates settings that would otherwise fail deep inside a request.
    pub fn validate(&self) -> Result<()> {
        self.provider()?;
        self.temperature()?;
        if self.llm.model.trim().is_empty() {
            return Err(ParleyError::config("llm.model must not be empty"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ParleyError::config("llm.timeout_secs must be at least 1"));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ParleyError::config("store.path must not be empty"));
        }
        Ok(())
    }
}

/// Credentials and endpoint for the hosted completion service.
#[derive(Clone)]
pub struct AzureCredentials {
    pub api_key: String,
    pub endpoint: Url,
    pub api_version: String,
}

impl std::fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureCredentials {
    /// Reads the three completion-service variables from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    ParleyError::config(format!("{name} environment variable not set"))
                })
        };

        let api_key = require(API_KEY_VAR)?;
        let endpoint_raw = require(ENDPOINT_VAR)?;
        let api_version = require(API_VERSION_VAR)?;

        let endpoint = Url::parse(&endpoint_raw).map_err(|e| {
            ParleyError::config(format!("Invalid {ENDPOINT_VAR} '{endpoint_raw}': {e}"))
        })?;
        if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
            return Err(ParleyError::config(format!(
                "Invalid scheme '{}' in {ENDPOINT_VAR}. Expected 'https' or 'http'",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            api_key,
            endpoint,
            api_version,
        })
    }
}
