//! Embedding engine for the knowledge base.
//!
//! Provides provider-agnostic embedding generation. The provider must match
//! the one the index was built with.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
