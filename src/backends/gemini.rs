// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::http::{build_client, require_text, send_json};
use super::ProviderBackend;
use crate::errors::ProviderError;

/// Google Gemini `generateContent` endpoint.
///
/// Built without an API key, the backend stays in the chain and reports
/// itself as not configured on every call.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiBackend {
    pub const NAME: &'static str = "gemini";

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

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ProviderBackend for GeminiBackend {
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

        let request = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 8192,
                top_p: 0.95,
                top_k: 40,
            },
        };
        let builder = self
            .client
            .post(self.generate_url())
            .query(&[("key", api_key.as_str())]);
        let response: GenerateContentResponse = send_json(Self::NAME, builder, &request).await?;

        let text = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text);
        require_text(Self::NAME, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reads_first_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "insight" }] }
                }]
            })))
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(
            server.uri(),
            "gemini-2.0-flash",
            Some("secret".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.generate("prompt").await.unwrap(), "insight");
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let server = MockServer::start().await;
        let backend =
            GeminiBackend::new(server.uri(), "m", None, Duration::from_secs(5)).unwrap();

        assert!(matches!(
            backend.generate("prompt").await,
            Err(ProviderError::NotConfigured { .. })
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_candidates_are_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let backend =
            GeminiBackend::new(server.uri(), "m", Some("k".into()), Duration::from_secs(5))
                .unwrap();
        assert!(matches!(
            backend.generate("prompt").await,
            Err(ProviderError::MalformedResponse { .. })
        ));
    }
}
