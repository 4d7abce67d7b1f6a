//! News source abstraction.

use pulse_core::AppResult;
use serde::{Deserialize, Serialize};

/// One search request against a news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRequest {
    /// Query string as sent (already phrase-quoted)
    pub q: String,

    /// Fields to search, comma separated
    pub search_in: String,

    /// ISO 639-1 language code
    pub language: String,

    /// Result ordering
    pub sort_by: String,

    /// Maximum number of articles
    pub page_size: usize,
}

impl NewsRequest {
    /// Most recent articles whose title or description contains `phrase`
    /// exactly.
    pub fn exact_phrase(phrase: &str, page_size: usize, language: &str) -> Self {
        Self {
            q: format!("\"{}\"", phrase),
            search_in: "title,description".to_string(),
            language: language.to_string(),
            sort_by: "publishedAt".to_string(),
            page_size,
        }
    }
}

/// Article summary returned by a news source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
        }
    }

    /// Lowercased `title + " " + description`, missing fields as "".
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

/// Trait for live news backends.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Backend name for logs (e.g., "newsapi")
    fn name(&self) -> &str;

    /// Run one search. Errors are reported, not retried.
    async fn search(&self, request: &NewsRequest) -> AppResult<Vec<Article>>;
}
