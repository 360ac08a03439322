use serde::{Deserialize, Serialize};

use crate::core::errors::GenerationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// One stateless generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Fails when `temperature` is outside `[0, 2]` or `max_tokens` is zero.
    pub fn new(
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, GenerationError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(GenerationError::InvalidRequest(format!(
                "temperature {} is outside [0, 2]",
                temperature
            )));
        }
        if max_tokens == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }

        Ok(Self {
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature,
            max_tokens,
        })
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(&self.user_prompt),
        ]
    }
}

/// Result of a context-constrained answer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    /// The model declined: context insufficient or the question is nonsensical.
    Unanswerable,
}

impl Answer {
    /// Any of these decode to `Unanswerable`: empty after trim, "null" in any
    /// case, or text containing "NULL".
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.contains("NULL") {
            return Answer::Unanswerable;
        }
        Answer::Text(trimmed.to_string())
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            Answer::Unanswerable => None,
        }
    }

    pub fn is_unanswerable(&self) -> bool {
        matches!(self, Answer::Unanswerable)
    }
}
