use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Narrow seam over the completion provider: one call, two strings in, one
/// string out. The dispatcher only ever sees this trait.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request(&self, system_prompt: &str, user_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_text.to_string(),
                },
            ],
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let request = self.build_request(system_prompt, user_text);
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!("Sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to completion API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error ({}): {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Completion response contained no choices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client() -> LlmClient {
        LlmClient::new(LlmConfig {
            api_key: "sk-test".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            system_prompt: String::new(),
        })
    }

    #[test]
    fn test_request_has_system_then_user() {
        let client = make_client();
        let request = client.build_request("You are terse.", "hi");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, "You are terse.");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, "hi");
        assert!(!request.stream);
    }

    #[test]
    fn test_request_serializes_provider_shape() {
        let client = make_client();
        let value = serde_json::to_value(client.build_request("", "question")).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "question");
    }

    #[test]
    fn test_response_first_choice_is_read() {
        let payload = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(payload).unwrap();
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("first"));
    }

    #[test]
    fn test_response_without_choices_yields_none() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(response.choices.into_iter().next().is_none());
    }
}
