//! LLM provider implementations.

pub mod gemini;
pub mod mock;
pub mod ollama;

pub use gemini::GeminiClient;
pub use mock::{MockLlmClient, MockReply};
pub use ollama::OllamaClient;

use pulse_core::AppError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to an error.
///
/// Client errors other than 408 and 429 (bad key, unknown model, malformed
/// request) will fail the same way on every attempt, so they become
/// `Config`, which is not retried. Everything else stays `Llm`.
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    let message = format!("{} API error ({}): {}", provider, status, body);

    if status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
    {
        AppError::Config(message)
    } else {
        AppError::Llm(message)
    }
}
