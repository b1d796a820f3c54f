// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Request plumbing shared by the HTTP backends.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;

/// Error bodies are cut to this many bytes before being logged.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(backend: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| ProviderError::NotConfigured {
            backend: backend.to_string(),
            reason: format!("failed to create HTTP client: {e}"),
        })
}

/// Send `request` with a JSON body and decode a JSON success body.
pub(crate) async fn send_json<B, R>(
    backend: &str,
    request: reqwest::RequestBuilder,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|source| ProviderError::Transport {
            backend: backend.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            backend: backend.to_string(),
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|e| ProviderError::MalformedResponse {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}

/// Reject a missing or blank completion so the cascade moves on.
pub(crate) fn require_text(backend: &str, text: Option<String>) -> Result<String, ProviderError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ProviderError::MalformedResponse {
            backend: backend.to_string(),
            reason: "response contained no text".to_string(),
        }),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééé", 3), "é...");
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("b", Some("  ".into())).is_err());
        assert!(require_text("b", None).is_err());
        assert_eq!(require_text("b", Some("ok".into())).unwrap(), "ok");
    }
}
