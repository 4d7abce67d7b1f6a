//! Grounded answer synthesis.
//!
//! Each route has its own prompt and refusal sentence. The model is told to
//! answer only from the supplied context and to reply with the refusal when
//! the context does not cover the question.

use crate::answer::Answer;
use crate::route::RouteDecision;
use pulse_core::{AppError, AppResult, Context};
use pulse_llm::{complete_with_policy, CallPolicy, LlmClient, LlmRequest};
use pulse_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Refusal for the static path when the prompt does not define one.
pub const STATIC_REFUSAL: &str = "I don't have enough information.";

/// Refusal for the live path when the prompt does not define one.
pub const LIVE_REFUSAL: &str = "I don't have enough live information to answer that.";

/// Turns a question plus retrieved context into an answer.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    policy: CallPolicy,
    static_prompt: PromptDefinition,
    live_prompt: PromptDefinition,
}

impl AnswerSynthesizer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
        policy: CallPolicy,
        static_prompt: PromptDefinition,
        live_prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            policy,
            static_prompt,
            live_prompt,
        }
    }

    /// Refusal sentence used on `route`.
    pub fn refusal(&self, route: RouteDecision) -> &str {
        let (prompt, fallback) = match route {
            RouteDecision::StaticKnowledge => (&self.static_prompt, STATIC_REFUSAL),
            RouteDecision::LiveKnowledge => (&self.live_prompt, LIVE_REFUSAL),
        };
        prompt.refusal.as_deref().unwrap_or(fallback)
    }

    /// Answer `question` from `context`.
    ///
    /// An insufficient context (empty, or only the live sentinel) yields the
    /// route's refusal without calling the model.
    ///
    /// # Errors
    /// * `SynthesisFailed` when the completion fails or comes back empty
    /// * `Cancelled` when `cancel` fires
    pub async fn synthesize(
        &self,
        question: &str,
        context: &Context,
        route: RouteDecision,
        cancel: &CancellationToken,
    ) -> AppResult<Answer> {
        let refusal = self.refusal(route).to_string();

        if context.is_insufficient() {
            tracing::info!("No usable {} context; answering with refusal", route);
            return Ok(Answer::new(refusal, route, context, true));
        }

        let prompt = match route {
            RouteDecision::StaticKnowledge => &self.static_prompt,
            RouteDecision::LiveKnowledge => &self.live_prompt,
        };

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context.render());
        variables.insert("refusal".to_string(), refusal.clone());
        let built = build_prompt(prompt, variables)
            .map_err(|e| AppError::SynthesisFailed(e.to_string()))?;

        let mut request =
            LlmRequest::new(built.user, &self.model).with_temperature(self.temperature);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = complete_with_policy(self.client.as_ref(), &request, &self.policy, cancel)
            .await
            .map_err(|e| match e {
                AppError::Cancelled => AppError::Cancelled,
                other => AppError::SynthesisFailed(other.to_string()),
            })?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::SynthesisFailed(
                "model returned an empty answer".to_string(),
            ));
        }

        let insufficient = is_refusal(text, &refusal);
        tracing::debug!(
            "Answer used {} prompt and {} completion tokens",
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        Ok(Answer::new(text, route, context, insufficient))
    }
}

/// Models sometimes echo the refusal with the quotes from the prompt.
fn is_refusal(text: &str, refusal: &str) -> bool {
    text.trim_matches(|c| c == '"' || c == '\'').trim() == refusal
}
