//! Question-answering pipeline.
//!
//! One question flows through exactly one retrieval path:
//!
//! ```text
//! question -> Router -> StaticKnowledge -> ContextRetriever -> AnswerSynthesizer
//!                    -> LiveKnowledge   -> normalize -> LiveFetcher -> AnswerSynthesizer
//! ```
//!
//! Routing and synthesis errors reach the caller. Retrieval failures do not;
//! each leaf degrades to an empty or sentinel context and the synthesizer
//! answers with the route's refusal.

use crate::answer::Answer;
use crate::route::RouteDecision;
use crate::router::Router;
use crate::synthesizer::AnswerSynthesizer;
use pulse_core::{AppConfig, AppError, AppResult, Context};
use pulse_knowledge::{ContextRetriever, DEFAULT_TOP_K};
use pulse_live::{normalize, LiveFetcher, DEFAULT_MAX_ARTICLES};
use pulse_llm::{create_client, CallPolicy};
use pulse_prompt::{
    load_prompt, LIVE_ANSWER_PROMPT_ID, ROUTER_PROMPT_ID, STATIC_ANSWER_PROMPT_ID,
};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Per-question retrieval bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    /// Knowledge chunks retrieved on the static path
    pub top_k: usize,

    /// Articles requested on the live path
    pub max_articles: usize,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_articles: DEFAULT_MAX_ARTICLES,
        }
    }
}

impl PipelineLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_articles: config.max_articles,
        }
    }
}

/// Routes a question and answers it from the selected source.
#[derive(Clone)]
pub struct Pipeline {
    router: Router,
    retriever: ContextRetriever,
    fetcher: LiveFetcher,
    synthesizer: AnswerSynthesizer,
    limits: PipelineLimits,
}

impl Pipeline {
    pub fn new(
        router: Router,
        retriever: ContextRetriever,
        fetcher: LiveFetcher,
        synthesizer: AnswerSynthesizer,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            router,
            retriever,
            fetcher,
            synthesizer,
            limits,
        }
    }

    /// Build every component from configuration.
    ///
    /// One completion client is shared by the router and the synthesizer.
    /// Prompts are loaded from the workspace, falling back to the built-ins.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )?;
        let policy = CallPolicy::from_config(config);

        let router = Router::new(
            client.clone(),
            &config.model,
            policy.clone(),
            load_prompt(&config.workspace, ROUTER_PROMPT_ID)?,
        );
        let synthesizer = AnswerSynthesizer::new(
            client,
            &config.model,
            config.temperature,
            policy,
            load_prompt(&config.workspace, STATIC_ANSWER_PROMPT_ID)?,
            load_prompt(&config.workspace, LIVE_ANSWER_PROMPT_ID)?,
        );

        let retriever = ContextRetriever::from_config(config)?;
        let fetcher = LiveFetcher::from_config(config)?;

        tracing::debug!(
            "Pipeline ready: provider={}, model={}, top_k={}, max_articles={}",
            config.provider,
            config.model,
            config.top_k,
            config.max_articles
        );

        Ok(Self::new(
            router,
            retriever,
            fetcher,
            synthesizer,
            PipelineLimits::from_config(config),
        ))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    pub fn limits(&self) -> PipelineLimits {
        self.limits
    }

    /// Answer a question.
    pub async fn answer(&self, question: &str) -> AppResult<Answer> {
        self.answer_with_cancellation(question, &CancellationToken::new())
            .await
    }

    /// Answer a question, aborting with `AppError::Cancelled` when `cancel`
    /// fires. No further outbound call is started after cancellation.
    ///
    /// # Errors
    /// * `InvalidInput` for an empty question
    /// * `RoutingAmbiguous` when the classifier reply is unusable
    /// * `SynthesisFailed` when the answer completion fails
    /// * `Cancelled`
    #[instrument(name = "answer", skip_all, fields(route = tracing::field::Empty))]
    pub async fn answer_with_cancellation(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("question is empty".to_string()));
        }

        tracing::info!("Answering question ({} chars)", question.len());

        let route = self.router.classify_with_cancellation(question, cancel).await?;
        tracing::Span::current().record("route", tracing::field::display(route));
        tracing::info!("Routed to {}", route);

        let context = self.gather_context(question, route, cancel).await?;
        tracing::info!(
            "Context assembled: {} snippets (insufficient: {})",
            context.len(),
            context.is_insufficient()
        );

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let answer = self
            .synthesizer
            .synthesize(question, &context, route, cancel)
            .await?;
        tracing::info!(
            "Answered ({} chars, insufficient: {})",
            answer.text.len(),
            answer.insufficient
        );

        Ok(answer)
    }

    /// Run the one retrieval path selected by `route`.
    async fn gather_context(
        &self,
        question: &str,
        route: RouteDecision,
        cancel: &CancellationToken,
    ) -> AppResult<Context> {
        match route {
            RouteDecision::StaticKnowledge => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AppError::Cancelled),
                    context = self.retriever.retrieve(question, self.limits.top_k) => Ok(context),
                }
            }
            RouteDecision::LiveKnowledge => {
                let query = normalize(question);
                tracing::debug!("Search phrase: {:?}", query.as_str());
                self.fetcher
                    .fetch_live_with_cancellation(&query, self.limits.max_articles, cancel)
                    .await
            }
        }
    }
}
