//! Live news retrieval.
//!
//! One search per question. Matching articles become `Live` snippets; any
//! failure of the news source becomes a single `Unavailable` snippet so the
//! answer step can still run.

use crate::newsapi::NewsApiClient;
use crate::query::SearchQuery;
use crate::source::{Article, NewsRequest, NewsSource};
use pulse_core::{AppConfig, AppError, AppResult, Context, ContextSnippet};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sentinel snippet text when the news source cannot be reached.
pub const LIVE_UNAVAILABLE_MESSAGE: &str = "Could not fetch live news at the moment.";

/// Default number of articles per question.
pub const DEFAULT_MAX_ARTICLES: usize = 3;

/// Live-knowledge retriever.
#[derive(Clone)]
pub struct LiveFetcher {
    source: Arc<dyn NewsSource>,
    language: String,
    timeout: Duration,
}

impl LiveFetcher {
    pub fn new(source: Arc<dyn NewsSource>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            source,
            language: language.into(),
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let client = NewsApiClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(client),
            config.news_language.clone(),
            config.request_timeout(),
        ))
    }

    /// Fetch up to `max_articles` recent articles for `query`. Never fails.
    pub async fn fetch_live(&self, query: &SearchQuery, max_articles: usize) -> Context {
        match self
            .fetch_live_with_cancellation(query, max_articles, &CancellationToken::new())
            .await
        {
            Ok(context) => context,
            Err(err) => {
                // Only reachable through cancellation, which a fresh token never signals
                tracing::warn!("Live fetch aborted: {}", err);
                Context::unavailable(LIVE_UNAVAILABLE_MESSAGE)
            }
        }
    }

    /// Like [`fetch_live`](Self::fetch_live), but aborts with
    /// `AppError::Cancelled` when `cancel` fires. No other error is returned.
    pub async fn fetch_live_with_cancellation(
        &self,
        query: &SearchQuery,
        max_articles: usize,
        cancel: &CancellationToken,
    ) -> AppResult<Context> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        if max_articles == 0 {
            return Ok(Context::empty());
        }

        if query.is_empty() {
            tracing::warn!("Search phrase is empty after normalization; skipping live fetch");
            return Ok(Context::unavailable(LIVE_UNAVAILABLE_MESSAGE));
        }

        let request = NewsRequest::exact_phrase(query.as_str(), max_articles, &self.language);
        tracing::debug!("Querying {} with q={}", self.source.name(), request.q);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.source.search(&request)) => result,
        };

        let articles = match outcome {
            Ok(Ok(articles)) => articles,
            Ok(Err(err)) => {
                tracing::warn!("Live fetch from {} failed: {}", self.source.name(), err);
                return Ok(Context::unavailable(LIVE_UNAVAILABLE_MESSAGE));
            }
            Err(_) => {
                let err = AppError::Timeout(format!(
                    "{} did not answer within {:?}",
                    self.source.name(),
                    self.timeout
                ));
                tracing::warn!("Live fetch failed: {}", err);
                return Ok(Context::unavailable(LIVE_UNAVAILABLE_MESSAGE));
            }
        };

        let selected = filter_articles(articles, query, max_articles);
        tracing::info!("Live fetch returned {} articles", selected.len());

        Ok(Context::new(
            selected
                .into_iter()
                .map(|article| {
                    ContextSnippet::article(
                        article.title.unwrap_or_default(),
                        article.description.unwrap_or_default(),
                    )
                })
                .collect(),
        ))
    }
}

/// Keep articles mentioning the query; fall back to all of them when none do.
fn filter_articles(articles: Vec<Article>, query: &SearchQuery, limit: usize) -> Vec<Article> {
    let needle = query.as_str().to_lowercase();

    let matching: Vec<Article> = articles
        .iter()
        .filter(|article| article.searchable_text().contains(&needle))
        .cloned()
        .collect();

    let mut selected = if matching.is_empty() {
        tracing::debug!("No article mentions {:?}; keeping unfiltered results", needle);
        articles
    } else {
        matching
    };

    selected.truncate(limit);
    selected
}
