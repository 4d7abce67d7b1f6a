//! Final answer returned by the pipeline.

use crate::route::RouteDecision;
use pulse_core::{Context, ContextSnippet};
use serde::Serialize;

/// A synthesized answer together with what it was grounded in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Trimmed answer text
    pub text: String,

    /// Route the question took
    pub route: RouteDecision,

    /// Snippets the answer was grounded in, most relevant first
    pub snippets: Vec<ContextSnippet>,

    /// True when the answer is the refusal sentence for its route
    pub insufficient: bool,
}

impl Answer {
    pub fn new(
        text: impl Into<String>,
        route: RouteDecision,
        context: &Context,
        insufficient: bool,
    ) -> Self {
        Self {
            text: text.into(),
            route,
            snippets: context.snippets().to_vec(),
            insufficient,
        }
    }
}
