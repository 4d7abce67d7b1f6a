//! Embedding provider trait and factory.

use pulse_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;

use super::providers::{GeminiEmbeddingProvider, OllamaProvider, TrigramProvider};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama", "gemini")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Construction never touches the network; an unreachable service surfaces
/// on the first `embed` call.
pub fn create_provider(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let dimensions = config.embedding_dimensions;

    match config.embedding_provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramProvider::new(dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            config.embedding_endpoint.as_deref(),
            &config.embedding_model,
            dimensions,
        )?)),

        "gemini" => {
            let api_key = config.api_key.as_deref().ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(GeminiEmbeddingProvider::new(
                config.embedding_endpoint.as_deref(),
                api_key,
                &config.embedding_model,
                dimensions,
            )?))
        }

        other => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, gemini",
            other
        ))),
    }
}
