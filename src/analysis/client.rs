//! Completion service client.
//!
//! `CompletionBackend` is the seam between the analyzer and the network;
//! `OpenAiBackend` speaks the OpenAI chat-completions wire format over
//! reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::analysis::json_path::{resolve_json_path, value_to_string};
use crate::error::{CompletionError, ConfigError};

/// Sampling temperature for diagnoses.
pub const TEMPERATURE: f32 = 0.2;

/// Completion token ceiling.
pub const MAX_TOKENS: u32 = 800;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
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

/// Constrains the reply to a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Diagnosis request: system instruction plus user prompt, JSON output.
    pub fn diagnosis(model: &str, system: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        }
    }
}

/// Something that can turn a request into completion text.
///
/// Returns the content of the first choice; an empty string means the
/// service answered without content.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    /// Client with `timeout` applied to every request.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::from_status(status.as_u16(), error_text));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Ok(extract_content(&body))
    }
}

/// Content of the first choice, empty when absent.
pub fn extract_content(body: &Value) -> String {
    resolve_json_path(body, "choices.0.message.content")
        .map(value_to_string)
        .unwrap_or_default()
}

fn classify_transport_error(e: reqwest::Error) -> CompletionError {
    if let Some(status) = e.status() {
        return CompletionError::from_status(status.as_u16(), e.to_string());
    }
    if e.is_timeout() || e.is_connect() || e.is_request() {
        return CompletionError::Connection(e.to_string());
    }
    CompletionError::InvalidResponse(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diagnosis_request_wire_shape() {
        let request = CompletionRequest::diagnosis("gpt-3.5-turbo", "sys", "prompt");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "prompt");
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["response_format"]["type"], "json_object");
        let temperature = value["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_extract_content() {
        let body = json!({"choices": [{"message": {"content": "{\"confidence\": 1}"}}]});
        assert_eq!(extract_content(&body), "{\"confidence\": 1}");

        let empty = json!({"choices": []});
        assert_eq!(extract_content(&empty), "");

        let null_content = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(extract_content(&null_content), "");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend =
            OpenAiBackend::new("key", "https://api.example.com/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.endpoint(), "https://api.example.com/v1/chat/completions");
    }
}
