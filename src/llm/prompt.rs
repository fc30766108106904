//! Prompt construction for completion requests.
//!
//! Builds the single user message that carries the schema summary and the
//! natural-language request.

use crate::llm::types::Message;

/// Exact phrase the model is told to answer with when no SELECT fits.
pub const REFUSAL_MESSAGE: &str = "⚠️ Only SELECT queries are allowed.";

/// Builds the prompt payload. Pure: identical inputs give identical output.
///
/// The schema summary and the request are embedded verbatim.
pub fn build_prompt(schema_summary: &str, request: &str) -> String {
    format!(
        "You are an expert SQL assistant. ONLY generate SELECT queries in SQLite.\n\
         Use JOINs if necessary.\n\
         \n\
         Database schema:\n\
         {schema_summary}\n\
         \n\
         Natural language request: {request}\n\
         \n\
         Return ONLY a valid SQL SELECT query. If not suitable, respond:\n\
         \"{REFUSAL_MESSAGE}\""
    )
}

/// Wraps the prompt as the message list sent to the completion service.
pub fn build_messages(schema_summary: &str, request: &str) -> Vec<Message> {
    vec![Message::user(build_prompt(schema_summary, request))]
}
