//! Chat-completion wire types shared by OpenAI-compatible backends

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::errors::{AiError, Result};

/// Message roles used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for `POST .../chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Response body from the completion endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    /// Some DashScope deployments put the text here instead of in `choices`
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub error: Option<ProviderErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionChoice {
    pub message: ChoiceMessage,
}

/// Assistant message inside a choice; role is optional on some backends
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Business error reported inside a 2xx body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub message: String,
}

impl CompletionResponse {
    /// Extract the assistant text, turning provider errors into `AiError`
    pub fn into_content(self) -> Result<String> {
        if let Some(error) = self.error {
            let message = if !error.message.trim().is_empty() {
                error.message
            } else if let Some(code) = error.code {
                format!("provider error code {}", code)
            } else {
                "unspecified provider error".to_string()
            };
            return Err(AiError::Provider(message));
        }

        let first = self
            .choices
            .into_iter()
            .next()
            .ok_or(AiError::EmptyChoices)?;
        let content = first.message.content.unwrap_or_default();

        if content.trim().is_empty() {
            if let Some(output) = self.output_text.filter(|o| !o.trim().is_empty()) {
                return Ok(output);
            }
        }
        Ok(content)
    }
}
