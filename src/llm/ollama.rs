use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::cleanup::clean_model_output;
use super::provider::TextGenerator;
use super::types::GenerationRequest;
use crate::core::errors::{GenerationError, SetupError};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const PROVIDER: &str = "ollama";

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, timeout_secs: u64) -> Result<Self, SetupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| SetupError::Config(format!("failed to build Ollama client: {}", err)))?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url
        } else {
            format!("http://{}", base_url)
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

fn chat_body(request: &GenerationRequest) -> Value {
    json!({
        "model": request.model_id,
        "messages": request.messages(),
        "stream": false,
        "options": {
            "temperature": request.temperature,
            "top_p": 1.0,
            "num_predict": request.max_tokens,
        },
    })
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/api/chat", self.base_url);

        let res = self
            .client
            .post(&url)
            .json(&chat_body(request))
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

        let content = payload["message"]["content"]
            .as_str()
            .ok_or_else(|| GenerationError::shape(PROVIDER, "missing message.content"))?;

        Ok(clean_model_output(content))
    }
}
