//! Mock LLM client for testing and offline use.
//!
//! Provides deterministic responses based on input patterns, a fixed reply,
//! or an echo of the prompt.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{ParleyError, Result};
use crate::llm::prompt::REFUSAL_MESSAGE;
use crate::llm::types::{Message, Role, Temperature};
use crate::llm::LlmClient;

/// How the mock produces its reply.
#[derive(Debug, Clone, Default)]
enum MockMode {
    /// Custom patterns, then schema-aware defaults, then the refusal phrase.
    #[default]
    Patterns,
    /// Always returns the same text.
    Fixed(String),
    /// Returns the last user message verbatim.
    Echo,
    /// Always fails with an LLM error.
    Failing(String),
}

/// One recorded `complete` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub messages: Vec<Message>,
    pub temperature: Temperature,
}

/// Mock LLM client that returns canned responses.
///
/// Clones share the call log, so a test can hand a boxed clone to the
/// pipeline and inspect what it received afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    mode: MockMode,
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that always answers with `reply`.
    pub fn fixed(reply: impl Into<String>) -> Self {
        Self {
            mode: MockMode::Fixed(reply.into()),
            ..Self::default()
        }
    }

    /// Creates a mock that echoes the prompt back.
    pub fn echo() -> Self {
        Self {
            mode: MockMode::Echo,
            ..Self::default()
        }
    }

    /// Creates a mock whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: MockMode::Failing(message.into()),
            ..Self::default()
        }
    }

    /// Adds a custom response mapping.
    ///
    /// When the request contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Generates a mock response for the full prompt text.
    fn mock_response(&self, prompt: &str) -> String {
        let request = extract_request(prompt).to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if request.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if request.contains("tables") {
            return "```sql\nSELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;\n```"
                .to_string();
        }

        // Schema-aware default: the first table named in the request.
        if let Some(table) = schema_tables(prompt)
            .into_iter()
            .find(|t| request.contains(&t.to_lowercase()))
        {
            let quoted = crate::db::quote_identifier(&table);
            if request.contains("count") || request.contains("how many") {
                return format!("```sql\nSELECT COUNT(*) FROM {quoted};\n```");
            }
            return format!("```sql\nSELECT * FROM {quoted} LIMIT 10;\n```");
        }

        REFUSAL_MESSAGE.to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// The natural-language request embedded in a prompt, or the whole text.
fn extract_request(prompt: &str) -> &str {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Natural language request: "))
        .unwrap_or(prompt)
}

/// Table names listed in the schema summary of a prompt.
fn schema_tables(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .filter_map(|line| line.strip_prefix("Table: "))
        .map(|name| name.trim().to_string())
        .collect()
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message], temperature: Temperature) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                messages: messages.to_vec(),
                temperature,
            });
        }

        let input = Self::extract_user_input(messages);
        match &self.mode {
            MockMode::Patterns => Ok(self.mock_response(&input)),
            MockMode::Fixed(reply) => Ok(reply.clone()),
            MockMode::Echo => Ok(input),
            MockMode::Failing(message) => Err(ParleyError::llm(message.clone())),
        }
    }
}
