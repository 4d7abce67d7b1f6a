//! Question router.
//!
//! Asks the model to classify a question as `vector` (static knowledge) or
//! `live` (current events). The reply must be exactly one of the two tokens.

use crate::route::RouteDecision;
use pulse_core::{AppError, AppResult};
use pulse_llm::{complete_with_policy, CallPolicy, LlmClient, LlmRequest};
use pulse_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// LLM-backed question classifier.
#[derive(Clone)]
pub struct Router {
    client: Arc<dyn LlmClient>,
    model: String,
    policy: CallPolicy,
    prompt: PromptDefinition,
}

impl Router {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        policy: CallPolicy,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            policy,
            prompt,
        }
    }

    /// Classify a question.
    pub async fn classify(&self, question: &str) -> AppResult<RouteDecision> {
        self.classify_with_cancellation(question, &CancellationToken::new())
            .await
    }

    /// Classify a question, aborting with `AppError::Cancelled` when
    /// `cancel` fires.
    ///
    /// # Errors
    /// * `InvalidInput` for an empty question
    /// * `RoutingAmbiguous` when the reply is neither `vector` nor `live`
    /// * completion errors (`Llm`, `Timeout`, `Cancelled`) as-is
    pub async fn classify_with_cancellation(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> AppResult<RouteDecision> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("question is empty".to_string()));
        }

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(0.0);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = complete_with_policy(self.client.as_ref(), &request, &self.policy, cancel).await?;
        let token = response.content.trim().to_lowercase();

        let route = RouteDecision::parse_token(&token)
            .ok_or_else(|| AppError::RoutingAmbiguous(response.content.clone()))?;

        tracing::debug!("Router answered {:?} -> {}", token, route);
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_llm::{MockLlmClient, MockReply};
    use pulse_prompt::{builtin_prompt, ROUTER_PROMPT_ID};
    use std::time::Duration;

    fn router(client: Arc<MockLlmClient>) -> Router {
        let policy = CallPolicy {
            timeout: Duration::from_secs(2),
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
        };
        Router::new(client, "test-model", policy, builtin_prompt(ROUTER_PROMPT_ID).unwrap())
    }

    #[tokio::test]
    async fn test_vector_and_live_tokens() {
        let client = Arc::new(MockLlmClient::scripted(["vector", "  LIVE\n"]));
        let router = router(client.clone());

        assert_eq!(
            router.classify("What is the capital of France?").await.unwrap(),
            RouteDecision::StaticKnowledge
        );
        assert_eq!(
            router.classify("Tesla stock today?").await.unwrap(),
            RouteDecision::LiveKnowledge
        );
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_carries_question_and_zero_temperature() {
        let client = Arc::new(MockLlmClient::scripted(["vector"]));
        router(client.clone())
            .classify("What is a bond?")
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert!(request.prompt.contains("Question: What is a bond?"));
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_ambiguous_output_is_surfaced() {
        for raw in ["maybe", "vector.", "live news", "vector or live", ""] {
            let client = Arc::new(MockLlmClient::scripted([raw]));
            let err = router(client).classify("Anything").await.unwrap_err();
            match err {
                AppError::RoutingAmbiguous(output) => assert_eq!(output, raw),
                other => panic!("expected RoutingAmbiguous for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_question_makes_no_call() {
        let client = Arc::new(MockLlmClient::scripted(["vector"]));
        let err = router(client.clone()).classify("   ").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let client = Arc::new(MockLlmClient::with_replies([
            MockReply::Error("503 unavailable".to_string()),
            MockReply::Text("live".to_string()),
        ]));

        let route = router(client.clone()).classify("Oil price now?").await.unwrap();
        assert_eq!(route, RouteDecision::LiveKnowledge);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let client = Arc::new(MockLlmClient::scripted(["vector"]));
        let token = CancellationToken::new();
        token.cancel();

        let err = router(client)
            .classify_with_cancellation("Anything", &token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
