// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::http::{build_client, require_text, send_json};
use super::ProviderBackend;
use crate::errors::ProviderError;

/// Local Ollama server via `POST {url}/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaBackend {
    pub const NAME: &'static str = "ollama";

    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            url: url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.url)
    }
}

#[async_trait]
impl ProviderBackend for OllamaBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse =
            send_json(Self::NAME, self.client.post(self.generate_url()), &request).await?;
        require_text(Self::NAME, response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_prompt_and_reads_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3.2",
                "prompt": "hi",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "response": "{\"ok\": true}",
                "done": true
            })))
            .mount(&server)
            .await;

        let backend =
            OllamaBackend::new(format!("{}/", server.uri()), "llama3.2", Duration::from_secs(5))
                .unwrap();
        assert_eq!(backend.generate("hi").await.unwrap(), "{\"ok\": true}");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let backend = OllamaBackend::new(server.uri(), "missing", Duration::from_secs(5)).unwrap();
        match backend.generate("hi").await {
            Err(ProviderError::Status { status, body, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let backend =
            OllamaBackend::new("http://127.0.0.1:9", "llama3.2", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            backend.generate("hi").await,
            Err(ProviderError::Transport { .. })
        ));
    }
}
