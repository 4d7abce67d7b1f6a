//! Scripted LLM client for tests and offline development.
//!
//! Replies come either from a queue of canned outcomes or from a handler
//! closure that sees each request. Every request is recorded so callers can
//! assert on prompts and on how many calls were made.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use pulse_core::{AppError, AppResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Respond with this text
    Text(String),

    /// Fail with a (retryable) provider error carrying this message
    Error(String),
}

type Handler = Box<dyn Fn(&LlmRequest) -> AppResult<String> + Send + Sync>;

enum Behavior {
    Script(Mutex<VecDeque<MockReply>>),
    Handler(Handler),
}

/// Mock LLM client.
pub struct MockLlmClient {
    behavior: Behavior,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Reply with the given texts in order, then fail.
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(replies.into_iter().map(|s| MockReply::Text(s.into())))
    }

    /// Reply with the given outcomes in order, then fail.
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            behavior: Behavior::Script(Mutex::new(replies.into_iter().collect())),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Compute each reply from the request.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&LlmRequest) -> AppResult<String> + Send + Sync + 'static,
    {
        Self {
            behavior: Behavior::Handler(Box::new(handler)),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before every reply (for timeout and cancellation paths).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
        match &self.behavior {
            Behavior::Handler(handler) => handler(request),
            Behavior::Script(queue) => {
                let reply = queue
                    .lock()
                    .map_err(|_| AppError::Llm("mock script lock poisoned".to_string()))?
                    .pop_front();

                match reply {
                    Some(MockReply::Text(text)) => Ok(text),
                    Some(MockReply::Error(message)) => Err(AppError::Llm(message)),
                    None => Err(AppError::Llm("mock script exhausted".to_string())),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = self.next_reply(request)?;
        Ok(LlmResponse::new(content, request.model.clone()))
    }
}
