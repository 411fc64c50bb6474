//! Ollama generator client (OpenAI-compatible API)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::outbound::{
    LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole,
};

/// Client for Ollama's OpenAI-compatible chat endpoint
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        // Generation can be slow on local hardware
        Self::with_timeout(base_url, model, 120)
    }

    pub fn with_timeout(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: normalize_base_url(base_url),
            model: model.to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Accept the base URL with or without a trailing `/v1`
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

#[async_trait]
impl LlmPort for OllamaClient {
    type Error = LlmError;

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_request = OpenAIChatRequest {
            model: self.model.clone(),
            messages: build_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(model = %self.model, messages = api_request.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.completions_url())
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| LlmError::RequestFailed(e.to_string()))?;
            return Err(LlmError::RequestFailed(format!("{}: {}", status, error_text)));
        }

        let api_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        convert_response(api_response)
    }
}

fn build_messages(request: &LlmRequest) -> Vec<OpenAIMessage> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = &request.system_prompt {
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(system.clone()),
        });
    }

    for msg in &request.messages {
        messages.push(OpenAIMessage {
            role: match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            }
            .to_string(),
            content: Some(msg.content.clone()),
        });
    }

    messages
}

fn convert_response(response: OpenAIChatResponse) -> Result<LlmResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in LLM response".to_string()))?;

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::ChatMessage;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://10.0.0.2:11434/v1"), "http://10.0.0.2:11434");
        let client = OllamaClient::new("http://localhost:11434/v1/", "llama3.2");
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_system_prompt_goes_first() {
        let request = LlmRequest::new(vec![ChatMessage::user("Hi")]).with_system_prompt("Be Toblen");
        let messages = build_messages(&request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_response_conversion() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Welcome!"},"finish_reason":"stop"}]}"#;
        let response: OpenAIChatResponse = serde_json::from_str(json).unwrap();
        let converted = convert_response(response).unwrap();
        assert_eq!(converted.content, "Welcome!");
        assert_eq!(converted.finish_reason.as_deref(), Some("stop"));

        let empty: OpenAIChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(convert_response(empty), Err(LlmError::InvalidResponse(_))));
    }
}
