//! Search phrase normalization for the live path.

use serde::Serialize;
use std::fmt;

/// Filler phrases removed from a question before it is sent to news search.
///
/// A phrase that is a prefix of a longer one comes after it, so
/// "what happened to" is removed whole rather than leaving a stray "to".
pub const STOP_PHRASES: &[&str] = &[
    "what is",
    "what are",
    "what happened to",
    "what happened",
    "latest",
    "current",
    "today",
    "this week",
    "news about",
];

/// Normalized search phrase derived from a question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn a question into a search phrase.
///
/// Lowercases, collapses whitespace, removes every occurrence of each stop
/// phrase by plain substring removal, collapses whitespace again and strips
/// trailing `?`, `!` and `.`. Words that merely contain a stop phrase are
/// garbled too (e.g. "currently" loses "current").
pub fn normalize(question: &str) -> SearchQuery {
    let mut text = collapse_whitespace(&question.to_lowercase());

    for phrase in STOP_PHRASES {
        text = text.replace(phrase, "");
    }

    let text = collapse_whitespace(&text);
    let text = text.trim_end_matches(['?', '!', '.']).trim();

    SearchQuery(text.to_string())
}
