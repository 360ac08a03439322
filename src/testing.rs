//! In-process fakes for the generation and embedding boundaries.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::GenerationError;
use crate::embedding::{EmbedDirection, Embedder};
use crate::llm::{clean_model_output, GenerationRequest, TextGenerator};

type Script = Box<dyn Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync>;

/// Generator whose output is computed from the request by a closure.
pub struct ScriptedGenerator {
    script: Script,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(request).map(|raw| clean_model_output(&raw))
    }
}

/// One dimension per keyword: 1.0 when the lowercased text contains it.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| if lower.contains(k.as_str()) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keyword-test"
    }

    async fn embed(
        &self,
        texts: &[String],
        _direction: EmbedDirection,
    ) -> Result<Vec<Vec<f32>>, GenerationError> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn embed(
        &self,
        _texts: &[String],
        _direction: EmbedDirection,
    ) -> Result<Vec<Vec<f32>>, GenerationError> {
        Err(GenerationError::transport("test", "connection refused"))
    }
}
