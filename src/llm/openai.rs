use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::cleanup::clean_model_output;
use super::provider::TextGenerator;
use super::types::GenerationRequest;
use crate::core::errors::{GenerationError, SetupError};

const DEFAULT_BASE_URL: &str = "http://localhost:1234";
const PROVIDER: &str = "openai-compatible";

/// Chat completions against any `/v1/chat/completions` server (LM Studio,
/// llama.cpp server, OpenAI).
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
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
            client,
        })
    }
}

fn chat_body(request: &GenerationRequest) -> Value {
    json!({
        "model": request.model_id,
        "messages": request.messages(),
        "stream": false,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut req = self.client.post(&url).json(&chat_body(request));
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

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| GenerationError::shape(PROVIDER, "missing choices[0].message.content"))?;

        Ok(clean_model_output(content))
    }
}
