//! Embedding provider implementations.

pub mod gemini;
pub mod ollama;
pub mod trigram;

pub use gemini::GeminiEmbeddingProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;
