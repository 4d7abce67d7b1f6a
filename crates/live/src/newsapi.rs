//! NewsAPI `/v2/everything` client.

use crate::source::{Article, NewsRequest, NewsSource};
use pulse_core::{AppConfig, AppError, AppResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NewsApiResponse {
    fn describe_error(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// NewsAPI client.
pub struct NewsApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl NewsApiClient {
    /// Create a client whose every request is bounded by `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(
            config.news_endpoint.clone(),
            config.news_api_key.clone(),
            config.request_timeout(),
        )
    }
}

/// Map a transport error without leaking the URL (it carries the API key).
fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(format!("news request: {}", e.without_url()))
    } else {
        AppError::LiveFetchFailed(e.without_url().to_string())
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiClient {
    fn name(&self) -> &str {
        "newsapi"
    }

    #[instrument(skip(self, request), fields(q = %request.q, page_size = request.page_size))]
    async fn search(&self, request: &NewsRequest) -> AppResult<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::LiveFetchFailed("NEWS_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(request)
            .query(&[("apiKey", api_key)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<NewsApiResponse>(&body)
                .map(|r| r.describe_error())
                .unwrap_or(body);
            return Err(AppError::LiveFetchFailed(format!(
                "NewsAPI returned {}: {}",
                status, detail
            )));
        }

        let body: NewsApiResponse = response.json().await.map_err(transport_error)?;
        if body.status == "error" {
            return Err(AppError::LiveFetchFailed(body.describe_error()));
        }

        debug!("NewsAPI returned {} articles", body.articles.len());
        Ok(body.articles)
    }
}
