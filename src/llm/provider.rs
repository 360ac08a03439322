use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::core::errors::GenerationError;

/// Text generation boundary. Implementations return output already passed
/// through [`clean_model_output`](super::clean_model_output).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name, e.g. "ollama".
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
