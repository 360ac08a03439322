pub mod cleanup;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

pub use cleanup::clean_model_output;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::TextGenerator;
pub use types::{Answer, ChatMessage, GenerationRequest};

use crate::core::config::{GenerationProviderKind, GenerationSettings};
use crate::core::errors::SetupError;

pub fn build_generator(settings: &GenerationSettings) -> Result<Box<dyn TextGenerator>, SetupError> {
    tracing::info!(
        "Generation model: {} via {:?}",
        settings.model,
        settings.provider
    );

    match settings.provider {
        GenerationProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(
            settings.base_url.clone(),
            settings.timeout_secs,
        )?)),
        GenerationProviderKind::OpenaiCompatible => Ok(Box::new(OpenAiProvider::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.timeout_secs,
        )?)),
    }
}
