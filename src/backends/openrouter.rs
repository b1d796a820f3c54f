// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::http::{build_client, require_text, send_json};
use super::ProviderBackend;
use crate::errors::ProviderError;

/// OpenRouter chat completions with a single user message.
#[derive(Debug, Clone)]
pub struct OpenRouterBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenRouterBackend {
    pub const NAME: &'static str = "openrouter";

    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ProviderBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Err(ProviderError::NotConfigured {
                backend: Self::NAME.to_string(),
                reason: "API key not configured".to_string(),
            });
        };

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let builder = self.client.post(self.chat_url()).bearer_auth(api_key);
        let response: ChatResponse = send_json(Self::NAME, builder, &request).await?;

        let text = response
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        require_text(Self::NAME, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_bearer_token_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "anthropic/claude-3-haiku",
                "messages": [{ "role": "user", "content": "prompt" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "hello" } }]
            })))
            .mount(&server)
            .await;

        let backend = OpenRouterBackend::new(
            server.uri(),
            "anthropic/claude-3-haiku",
            Some("sk-test".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.generate("prompt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let backend =
            OpenRouterBackend::new(server.uri(), "m", Some("k".into()), Duration::from_secs(5))
                .unwrap();
        let error = backend.generate("prompt").await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "backend 'openrouter' returned HTTP 503: overloaded"
        );
    }
}
