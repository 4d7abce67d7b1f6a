//! Retrieved context shared by the retrieval leaves and the synthesizer.
//!
//! A [`Context`] is an ordered list of [`ContextSnippet`]s, most relevant
//! first. Both the static knowledge retriever and the live news fetcher
//! produce one, and the answer synthesizer flattens it into prompt text.

use serde::{Deserialize, Serialize};

/// Separator placed between snippets when a context is flattened to text.
pub const SNIPPET_SEPARATOR: &str = "\n\n";

/// Where a snippet came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnippetOrigin {
    /// A chunk from the static knowledge index, with its similarity score
    Knowledge { score: f32 },

    /// An article summary from the live news source
    Live,

    /// Marker standing in for live data that could not be fetched
    Unavailable,
}

/// A unit of retrieved text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// Raw text of the snippet
    pub source_text: String,

    /// Optional headline (live articles)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional summary (live article descriptions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub origin: SnippetOrigin,
}

impl ContextSnippet {
    /// Snippet backed by a knowledge-base chunk.
    pub fn knowledge(text: impl Into<String>, score: f32) -> Self {
        Self {
            source_text: text.into(),
            title: None,
            summary: None,
            origin: SnippetOrigin::Knowledge { score },
        }
    }

    /// Snippet backed by a live news article.
    pub fn article(title: impl Into<String>, description: impl Into<String>) -> Self {
        let title = title.into();
        let description = description.into();
        Self {
            source_text: format!("{} {}", title, description).trim().to_string(),
            title: Some(title),
            summary: Some(description),
            origin: SnippetOrigin::Live,
        }
    }

    /// Sentinel snippet carrying a human-readable "no data" marker.
    pub fn unavailable(marker: impl Into<String>) -> Self {
        Self {
            source_text: marker.into(),
            title: None,
            summary: None,
            origin: SnippetOrigin::Unavailable,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.origin == SnippetOrigin::Unavailable
    }

    /// Render the snippet as prompt text.
    ///
    /// Snippets with a title or summary render as a `Title:`/`Description:`
    /// pair; plain chunks render as their source text.
    pub fn render(&self) -> String {
        if self.title.is_none() && self.summary.is_none() {
            return self.source_text.clone();
        }

        format!(
            "Title: {}\nDescription: {}",
            self.title.as_deref().unwrap_or_default(),
            self.summary.as_deref().unwrap_or_default()
        )
    }
}

/// Ordered sequence of snippets, most relevant first.
///
/// Duplicates are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    snippets: Vec<ContextSnippet>,
}

impl Context {
    pub fn new(snippets: Vec<ContextSnippet>) -> Self {
        Self { snippets }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Context made of a single sentinel snippet.
    pub fn unavailable(marker: impl Into<String>) -> Self {
        Self::new(vec![ContextSnippet::unavailable(marker)])
    }

    pub fn snippets(&self) -> &[ContextSnippet] {
        &self.snippets
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// True when there is nothing an answer could be grounded in: the context
    /// is empty or holds only sentinel snippets.
    pub fn is_insufficient(&self) -> bool {
        self.snippets.iter().all(ContextSnippet::is_unavailable)
    }

    /// Flatten to a single text block, snippets separated by a blank line.
    pub fn render(&self) -> String {
        self.snippets
            .iter()
            .map(ContextSnippet::render)
            .collect::<Vec<_>>()
            .join(SNIPPET_SEPARATOR)
    }
}

impl From<Vec<ContextSnippet>> for Context {
    fn from(snippets: Vec<ContextSnippet>) -> Self {
        Self::new(snippets)
    }
}

impl IntoIterator for Context {
    type Item = ContextSnippet;
    type IntoIter = std::vec::IntoIter<ContextSnippet>;

    fn into_iter(self) -> Self::IntoIter {
        self.snippets.into_iter()
    }
}
