use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{EmbedDirection, Embedder};
use crate::core::errors::{GenerationError, SetupError};

const DEFAULT_BASE_URL: &str = "http://localhost:1234";
const PROVIDER: &str = "openai-compatible embeddings";

/// Any server exposing `/v1/embeddings` (LM Studio, llama.cpp, OpenAI).
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, SetupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| SetupError::Config(format!("failed to build HTTP client: {}", err)))?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        })
    }
}

fn parse_embeddings(payload: &Value) -> Result<Vec<Vec<f32>>, GenerationError> {
    let data = payload["data"]
        .as_array()
        .ok_or_else(|| GenerationError::shape(PROVIDER, "missing 'data' array"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let vals = item["embedding"]
            .as_array()
            .ok_or_else(|| GenerationError::shape(PROVIDER, "missing 'embedding' field"))?;
        let vec: Vec<f32> = vals
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();
        embeddings.push(vec);
    }
    Ok(embeddings)
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    // The OpenAI protocol has no document/query distinction.
    async fn embed(
        &self,
        texts: &[String],
        _direction: EmbedDirection,
    ) -> Result<Vec<Vec<f32>>, GenerationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": texts,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.trim());
        }

        let res = req
            .send()
            .await
            .map_err(|err| GenerationError::transport(PROVIDER, err))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: PROVIDER,
                status,
                body: text,
            });
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| GenerationError::shape(PROVIDER, err.to_string()))?;
        let embeddings = parse_embeddings(&payload)?;
        if embeddings.len() != texts.len() {
            return Err(GenerationError::shape(
                PROVIDER,
                format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    embeddings.len()
                ),
            ));
        }
        Ok(embeddings)
    }
}
