//! Typed view over the merged `config.yml` + `secrets.yaml` document.
//!
//! Every field carries a serde default so an absent or partial config file
//! still yields a usable configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::rag::Metric;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub generation: GenerationSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub parametric: ParametricSettings,
    pub grounded: GroundedSettings,
    pub vectorize: VectorizeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProviderKind {
    Ollama,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: GenerationProviderKind,
    /// Defaults to `OLLAMA_HOST` or the provider's local endpoint.
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::Ollama,
            base_url: None,
            model: "gemma3n".to_string(),
            api_key: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    Cohere,
    OpenaiCompatible,
}

/// The embedding model must be the one the store was built with, so it is a
/// single explicit value rather than a per-call choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub base_url: Option<String>,
    pub model: String,
    pub version: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Cohere,
            base_url: None,
            model: "embed-english-v3.0".to_string(),
            version: "3.0".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Unset means each pipeline picks its own default metric.
    pub metric: Option<Metric>,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            metric: None,
            top_k: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametricSettings {
    pub generations: usize,
    pub question_temperature: f32,
    pub answer_temperature: f32,
    pub max_tokens: u32,
    pub flush_every: usize,
}

impl Default for ParametricSettings {
    fn default() -> Self {
        Self {
            generations: 1000,
            question_temperature: 0.7,
            answer_temperature: 0.2,
            max_tokens: 350,
            flush_every: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Embed every generated question and search with it.
    Question,
    /// Search with the stored vector of the first chunk in the seed group.
    SeedChunk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundedSettings {
    pub chunk_size: usize,
    pub question_temperature: f32,
    pub question_max_tokens: u32,
    pub answer_temperature: f32,
    pub answer_max_tokens: u32,
    pub flush_every: usize,
    pub query_mode: QueryMode,
    pub source_tag: Option<String>,
}

impl Default for GroundedSettings {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            question_temperature: 0.8,
            question_max_tokens: 300,
            answer_temperature: 0.3,
            answer_max_tokens: 400,
            flush_every: 10,
            query_mode: QueryMode::Question,
            source_tag: Some("advanced_firstaid_rag".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks whose trimmed text has this many characters or fewer are skipped
    pub min_chunk_chars: usize,
    pub batch_size: usize,
}

impl Default for VectorizeSettings {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 128,
            min_chunk_chars: 50,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `medqa_synth=debug`
    pub level: String,
    /// Prefix of the daily rolling file in the log directory
    pub file_name: String,
    pub stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_name: "medqa-synth.log".to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_document_keeps_defaults() {
        let config: SynthConfig = serde_json::from_value(json!({
            "retrieval": { "metric": "cosine" },
            "grounded": { "query_mode": "seed_chunk" }
        }))
        .unwrap();

        assert_eq!(config.retrieval.metric, Some(Metric::Cosine));
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.grounded.query_mode, QueryMode::SeedChunk);
        assert_eq!(config.grounded.chunk_size, 5);
        assert_eq!(config.generation.model, "gemma3n");
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Cohere);
    }

    #[test]
    fn empty_document_is_default() {
        let config: SynthConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.parametric.generations, 1000);
        assert_eq!(config.parametric.flush_every, 1);
        assert_eq!(config.grounded.flush_every, 10);
        assert_eq!(config.vectorize.chunk_overlap, 128);
        assert_eq!(config.vectorize.min_chunk_chars, 50);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file_name, "medqa-synth.log");
    }
}
