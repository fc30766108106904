//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::{AzureCredentials, Config};
use crate::error::Result;
use crate::llm::{AzureConfig, AzureOpenAiClient, LlmClient, LlmProvider, MockLlmClient};

/// Creates an LLM client for the given provider.
///
/// The Azure provider needs credentials, which `main` resolves and validates
/// at startup; passing `None` reads them from the environment here.
pub fn create_client(
    provider: LlmProvider,
    config: &Config,
    credentials: Option<AzureCredentials>,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::Azure => {
            let credentials = match credentials {
                Some(credentials) => credentials,
                None => AzureCredentials::from_env()?,
            };
            let azure = AzureConfig::new(credentials, config.llm.model.clone())
                .with_timeout(config.llm.timeout_secs);
            Ok(Box::new(AzureOpenAiClient::new(azure)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
