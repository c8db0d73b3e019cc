//! OpenAI chat-completions provider
//!
//! Sends a single system message and asks for a JSON object back.

use crate::{
    error::{AppError, AppResult},
    services::providers::{http_client, ModelProvider},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            api_key: api_key.trim().to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Lists models to confirm the API is reachable and the key is accepted
    pub async fn check_connection(&self) -> bool {
        let result = self
            .http_client
            .get(format!("{}/models", self.api_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(model = %self.model, "OpenAI connection test successful");
                true
            }
            Ok(response) => {
                tracing::error!(status = %response.status(), "OpenAI connection test failed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "OpenAI connection test failed");
                false
            }
        }
    }

    fn build_request<'a>(&'a self, system_prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: system_prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }

    fn map_error_status(status: StatusCode) -> AppError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::UpstreamAuth(
                "Authentication with the language model API failed".to_string(),
            ),
            StatusCode::TOO_MANY_REQUESTS => AppError::ExternalApi(
                "Language model quota exceeded or rate limited".to_string(),
            ),
            _ => AppError::ExternalApi(format!("Language model API returned status {}", status)),
        }
    }

    fn first_content(response: ChatResponse) -> Option<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    async fn complete(&self, system_prompt: &str) -> AppResult<Option<String>> {
        tracing::debug!(model = %self.model, "Sending request to OpenAI");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&self.build_request(system_prompt))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "OpenAI request failed");
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI API request failed");
            return Err(Self::map_error_status(status));
        }

        let chat: ChatResponse = response.json().await?;
        let content = Self::first_content(chat);

        tracing::info!(
            model = %self.model,
            has_content = content.is_some(),
            provider = "openai",
            "Received response from OpenAI"
        );

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
