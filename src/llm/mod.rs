//! LLM integration for Parley.
//!
//! Provides the completion-client trait, the Azure OpenAI implementation,
//! a mock, prompt construction and response sanitizing.

pub mod azure;
pub mod factory;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod types;

pub use azure::{AzureConfig, AzureOpenAiClient};
pub use factory::create_client;
pub use mock::{MockCall, MockLlmClient};
pub use parser::sanitize_sql;
pub use prompt::{build_messages, build_prompt, REFUSAL_MESSAGE};
pub use types::{Message, Role, Temperature};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Makes exactly one request and returns the reply text unchanged.
    async fn complete(&self, messages: &[Message], temperature: Temperature) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Azure-hosted OpenAI deployment.
    #[default]
    Azure,
    /// Mock client for testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "azure",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" | "azure-openai" => Ok(Self::Azure),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("azure".parse::<LlmProvider>().unwrap(), LlmProvider::Azure);
        assert_eq!("Azure".parse::<LlmProvider>().unwrap(), LlmProvider::Azure);
        assert_eq!("mock".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("openai".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_provider_display_and_default() {
        assert_eq!(format!("{}", LlmProvider::Mock), "mock");
        assert_eq!(LlmProvider::default(), LlmProvider::Azure);
    }

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::fixed("SELECT 1"));
        let response = client
            .complete(&[Message::user("anything")], Temperature::default())
            .await
            .unwrap();
        assert_eq!(response, "SELECT 1");
    }
}
