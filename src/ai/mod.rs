//! AI explanations for flashcards
//!
//! The [`ExplanationProvider`] trait is the only thing the rest of the
//! crate depends on. [`ChatCompletionsClient`] implements it against any
//! OpenAI-compatible `/chat/completions` endpoint (DeepSeek by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::Card;
use crate::settings::{AiConfig, Settings};

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No AI API key configured")]
    MissingApiKey,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("The model returned an empty response")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, AiError>;

/// Produces an explanation for a rendered prompt
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn generate_explanation(&self, prompt: &str) -> Result<String>;
}

/// Substitute `{front}` and `{back}` in `template` with the card's text
pub fn render_prompt(template: &str, card: &Card) -> String {
    template
        .replace("{front}", &card.front)
        .replace("{back}", &card.back)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

/// Pull a readable message out of an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(api_key: impl Into<String>, config: &AiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Build a client from settings; fails when no API key is set
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = settings.api_key().ok_or(AiError::MissingApiKey)?;
        Self::new(key, &settings.ai)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ExplanationProvider for ChatCompletionsClient {
    async fn generate_explanation(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        log::debug!("Requesting explanation from {} ({})", self.base_url, self.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Explanation request failed with {}", status);
            return Err(AiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response.json::<ChatResponse>().await?.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new(1, 1, "What is a closure?".to_string(), "A function plus its scope".to_string())
    }

    #[test]
    fn test_render_prompt_substitutes_all_placeholders() {
        let prompt = render_prompt("Q: {front}\nA: {back}\nAgain: {front}", &card());
        assert_eq!(
            prompt,
            "Q: What is a closure?\nA: A function plus its scope\nAgain: What is a closure?"
        );
    }

    #[test]
    fn test_render_prompt_without_placeholders() {
        assert_eq!(render_prompt("Explain", &card()), "Explain");
    }

    #[test]
    fn test_response_takes_first_choice() {
        let json = r#"{
            "id": "x",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  First  "}},
                {"index": 1, "message": {"role": "assistant", "content": "Second"}}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), "First");
    }

    #[test]
    fn test_empty_response_is_an_error() {
        for json in [
            r#"{"choices": []}"#,
            r#"{}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#,
            r#"{"choices": [{"message": {"role": "assistant", "content": "   "}}]}"#,
        ] {
            let response: ChatResponse = serde_json::from_str(json).unwrap();
            assert!(matches!(response.into_text(), Err(AiError::EmptyResponse)));
        }
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"message": "Authentication Fails", "type": "auth"}}"#;
        assert_eq!(error_message(body), "Authentication Fails");
        assert_eq!(error_message(" bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "deepseek-chat",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_client_requires_api_key() {
        let settings = Settings::default();
        assert!(matches!(
            ChatCompletionsClient::from_settings(&settings),
            Err(AiError::MissingApiKey)
        ));

        let settings = Settings {
            ai_api_key: Some("sk-test".to_string()),
            ai: AiConfig {
                base_url: "http://localhost:9/v1/".to_string(),
                model: "m".to_string(),
            },
            ..Default::default()
        };
        let client = ChatCompletionsClient::from_settings(&settings).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
    }
}
