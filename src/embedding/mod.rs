//! Embedding service boundary.
//!
//! Store vectors and query vectors must come from the same model, so the
//! model is fixed when the client is built and every call goes through it.

mod cohere;
mod openai;

use async_trait::async_trait;

pub use cohere::CohereEmbedder;
pub use openai::OpenAiEmbedder;

use crate::core::config::{EmbeddingProviderKind, EmbeddingSettings};
use crate::core::errors::{GenerationError, SetupError};

/// Whether the text is a stored passage or a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedDirection {
    Document,
    Query,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, including its version where the provider has one.
    fn model_id(&self) -> &str;

    async fn embed(
        &self,
        texts: &[String],
        direction: EmbedDirection,
    ) -> Result<Vec<Vec<f32>>, GenerationError>;

    async fn embed_one(
        &self,
        text: &str,
        direction: EmbedDirection,
    ) -> Result<Vec<f32>, GenerationError> {
        let mut vectors = self.embed(&[text.to_string()], direction).await?;
        if vectors.len() != 1 {
            return Err(GenerationError::shape(
                "embedding",
                format!("expected 1 vector, got {}", vectors.len()),
            ));
        }
        Ok(vectors.remove(0))
    }
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>, SetupError> {
    tracing::info!(
        "Embedding model: {} (version {})",
        settings.model,
        settings.version
    );

    match settings.provider {
        EmbeddingProviderKind::Cohere => {
            let api_key = settings
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or(SetupError::MissingCredential("COHERE_API_KEY"))?;
            Ok(Box::new(CohereEmbedder::new(
                settings.base_url.clone(),
                api_key,
                settings.model.clone(),
                settings.timeout_secs,
            )?))
        }
        EmbeddingProviderKind::OpenaiCompatible => Ok(Box::new(OpenAiEmbedder::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.model.clone(),
            settings.timeout_secs,
        )?)),
    }
}
