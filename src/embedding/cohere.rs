use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbedDirection, Embedder};
use crate::core::errors::{GenerationError, SetupError};

const DEFAULT_BASE_URL: &str = "https://api.cohere.ai/v1";
const PROVIDER: &str = "cohere";

pub struct CohereEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl CohereEmbedder {
    pub fn new(
        base_url: Option<String>,
        api_key: String,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, SetupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| SetupError::Config(format!("failed to build Cohere client: {}", err)))?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [String],
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f64>>,
}

fn input_type(direction: EmbedDirection) -> &'static str {
    match direction {
        EmbedDirection::Document => "search_document",
        EmbedDirection::Query => "search_query",
    }
}

#[async_trait]
impl Embedder for CohereEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn embed(
        &self,
        texts: &[String],
        direction: EmbedDirection,
    ) -> Result<Vec<Vec<f32>>, GenerationError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| GenerationError::InvalidRequest("invalid Cohere API key".to_string()))?,
        );

        let body = EmbedRequest {
            model: &self.model,
            texts,
            input_type: input_type(direction),
        };

        let url = format!("{}/embed", self.base_url);
        let res = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::transport(PROVIDER, err))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let payload: EmbedResponse = res
            .json()
            .await
            .map_err(|err| GenerationError::shape(PROVIDER, err.to_string()))?;

        if payload.embeddings.len() != texts.len() {
            return Err(GenerationError::shape(
                PROVIDER,
                format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    payload.embeddings.len()
                ),
            ));
        }

        Ok(payload
            .embeddings
            .into_iter()
            .map(|vector| vector.into_iter().map(|v| v as f32).collect())
            .collect())
    }
}
