//! Routing decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which data source answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Answerable from the prebuilt knowledge index
    StaticKnowledge,

    /// Depends on current events; answered from live news
    LiveKnowledge,
}

impl RouteDecision {
    /// Parse the classifier's token. Input must already be trimmed and
    /// lowercased; anything other than `vector` or `live` is rejected.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "vector" => Some(Self::StaticKnowledge),
            "live" => Some(Self::LiveKnowledge),
            _ => None,
        }
    }

    /// Token the classifier uses for this route.
    pub fn as_token(&self) -> &'static str {
        match self {
            Self::StaticKnowledge => "vector",
            Self::LiveKnowledge => "live",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StaticKnowledge => "static",
            Self::LiveKnowledge => "live",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(
            RouteDecision::parse_token("vector"),
            Some(RouteDecision::StaticKnowledge)
        );
        assert_eq!(
            RouteDecision::parse_token("live"),
            Some(RouteDecision::LiveKnowledge)
        );
        assert_eq!(RouteDecision::parse_token("Live"), None);
        assert_eq!(RouteDecision::parse_token("live."), None);
        assert_eq!(RouteDecision::parse_token(""), None);
    }

    #[test]
    fn test_token_roundtrip() {
        for route in [RouteDecision::StaticKnowledge, RouteDecision::LiveKnowledge] {
            assert_eq!(RouteDecision::parse_token(route.as_token()), Some(route));
        }
    }

    #[test]
    fn test_serialized_form() {
        assert_eq!(
            serde_json::to_string(&RouteDecision::LiveKnowledge).unwrap(),
            "\"live_knowledge\""
        );
    }
}
