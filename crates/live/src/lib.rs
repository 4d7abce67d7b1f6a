//! Live news retrieval for Pulse.
//!
//! - [`normalize`] turns a question into a [`SearchQuery`]
//! - [`NewsSource`] abstracts the news backend; [`NewsApiClient`] talks to NewsAPI
//! - [`LiveFetcher`] runs one bounded search and shapes the result into a
//!   [`pulse_core::Context`]

pub mod fetcher;
pub mod newsapi;
pub mod query;
pub mod source;

#[cfg(test)]
mod test_support;

pub use fetcher::{LiveFetcher, DEFAULT_MAX_ARTICLES, LIVE_UNAVAILABLE_MESSAGE};
pub use newsapi::{NewsApiClient, DEFAULT_NEWS_ENDPOINT};
pub use query::{normalize, SearchQuery, STOP_PHRASES};
pub use source::{Article, NewsRequest, NewsSource};
