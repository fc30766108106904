//! Azure OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for an Azure-hosted chat-completions
//! deployment. One request per call: no retries, no streaming.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::AzureCredentials;
use crate::error::{ParleyError, Result};
use crate::llm::types::{Message, Temperature};
use crate::llm::LlmClient;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Azure OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    /// Endpoint, key and API version.
    pub credentials: AzureCredentials,
    /// Deployment (model) name, e.g. "gpt-4o-mini".
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl AzureConfig {
    /// Creates a new config with the given credentials and model.
    pub fn new(credentials: AzureCredentials, model: impl Into<String>) -> Self {
        Self {
            credentials,
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Full chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> Result<Url> {
        let mut base = self.credentials.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(&format!("openai/deployments/{}/chat/completions", self.model))
            .map_err(|e| ParleyError::config(format!("Invalid completions URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.credentials.api_version);
        Ok(url)
    }
}

/// Azure OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    config: AzureConfig,
    url: Url,
    client: Client,
}

impl AzureOpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: AzureConfig) -> Result<Self> {
        let url = config.completions_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParleyError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            url,
            client,
        })
    }

    /// Converts internal messages to the chat-completions wire format.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Maps a non-success response to an error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> ParleyError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ParleyError::llm("Authentication failed. Check your OPENAI_API_KEY.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ParleyError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<ChatErrorResponse>(body) {
            return ParleyError::llm(format!(
                "Azure OpenAI API error: {}",
                error_response.error.message
            ));
        }

        ParleyError::llm(format!("Azure OpenAI API error ({}): {}", status, body))
    }

    fn parse_success(body: &str) -> Result<String> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| ParleyError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ParleyError::llm("No response from Azure OpenAI"))
    }
}

#[async_trait]
impl LlmClient for AzureOpenAiClient {
    async fn complete(&self, messages: &[Message], temperature: Temperature) -> Result<String> {
        let request = ChatRequest {
            messages: Self::convert_messages(messages),
            temperature: temperature.value(),
        };

        debug!(model = %self.config.model, %temperature, "Azure OpenAI request");

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", &self.config.credentials.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ParleyError::llm(format!(
                        "Request timed out after {} seconds.",
                        self.config.timeout_secs
                    ))
                } else if e.is_connect() {
                    ParleyError::llm("Failed to connect to Azure OpenAI. Check your network.")
                } else {
                    ParleyError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ParleyError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        Self::parse_success(&body)
    }
}

// Chat-completions wire types

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}
