// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::cache::{CachedResponse, ResponseCache};
use super::parse::parse_response;
use super::ProviderBackend;
use crate::errors::ProviderError;
use crate::observability::messages::provider::{
    BackendAttempt, BackendFailed, BackendResponded, CacheHit, CascadeExhausted,
};
use crate::observability::messages::StructuredLog;

pub const DEFAULT_CONTEXT: &str = "general";
pub const PLACEHOLDER_FLAG: &str = "_placeholder";
pub const PLACEHOLDER_NOTICE_KEY: &str = "_notice";
pub const PLACEHOLDER_NOTICE: &str =
    "Placeholder data: no text-generation backend was reachable. Configure a backend for a real analysis.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// JSON found in the backend's text
    Structured,
    /// Free text wrapped as `{"text": ...}`
    Text,
    /// Every backend failed; synthetic data
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeResponse {
    pub value: Value,
    pub kind: ResponseKind,
    /// Backend that produced the text; `None` for placeholders.
    pub provider: Option<String>,
    pub cached: bool,
}

impl CascadeResponse {
    pub fn is_placeholder(&self) -> bool {
        self.kind == ResponseKind::Placeholder
    }
}

/// Ordered fallback chain over text-generation backends.
///
/// Backends are tried one at a time in order; the next one is only called if
/// the previous returned an error. The call itself never fails: when every
/// backend is exhausted the result is a flagged placeholder.
pub struct ProviderCascade {
    backends: Vec<Arc<dyn ProviderBackend>>,
    cache: Option<Arc<ResponseCache>>,
    placeholders: HashMap<String, Value>,
}

impl ProviderCascade {
    pub fn new(backends: Vec<Arc<dyn ProviderBackend>>) -> Self {
        Self {
            backends,
            cache: None,
            placeholders: HashMap::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Default fields merged into the placeholder for `context`.
    pub fn with_placeholder(mut self, context: impl Into<String>, template: Value) -> Self {
        self.placeholders.insert(context.into(), template);
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    pub async fn call(&self, prompt: &str) -> CascadeResponse {
        self.call_in(DEFAULT_CONTEXT, prompt).await
    }

    /// Like [`call`](Self::call), with `context` selecting the placeholder
    /// template and tagging log lines.
    pub async fn call_in(&self, context: &str, prompt: &str) -> CascadeResponse {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(prompt).await {
                CacheHit {
                    context,
                    backend: &hit.backend,
                }
                .log();
                return Self::parsed(hit.text.as_str(), hit.backend, true);
            }
        }

        match self.first_success(context, prompt).await {
            Ok((backend, text)) => {
                if let Some(cache) = &self.cache {
                    cache
                        .insert(
                            prompt,
                            CachedResponse {
                                text: text.clone(),
                                backend: backend.clone(),
                            },
                        )
                        .await;
                }
                Self::parsed(&text, backend, false)
            }
            Err(_failures) => {
                CascadeExhausted {
                    context,
                    backend_count: self.backends.len(),
                }
                .log();
                CascadeResponse {
                    value: self.placeholder(context),
                    kind: ResponseKind::Placeholder,
                    provider: None,
                    cached: false,
                }
            }
        }
    }

    /// `(backend name, text)` from the first backend that answers, or every
    /// backend's error in order.
    async fn first_success(
        &self,
        context: &str,
        prompt: &str,
    ) -> Result<(String, String), Vec<ProviderError>> {
        let mut failures = Vec::with_capacity(self.backends.len());
        for (position, backend) in self.backends.iter().enumerate() {
            BackendAttempt {
                context,
                backend: backend.name(),
                position,
                backend_count: self.backends.len(),
            }
            .log();

            let started = Instant::now();
            match backend.generate(prompt).await {
                Ok(text) => {
                    BackendResponded {
                        context,
                        backend: backend.name(),
                        response_len: text.len(),
                        duration: started.elapsed(),
                    }
                    .log();
                    return Ok((backend.name().to_string(), text));
                }
                Err(error) => {
                    BackendFailed {
                        context,
                        backend: backend.name(),
                        error: &error,
                    }
                    .log();
                    failures.push(error);
                }
            }
        }
        Err(failures)
    }

    fn parsed(text: &str, backend: String, cached: bool) -> CascadeResponse {
        let (value, kind) = parse_response(text);
        CascadeResponse {
            value,
            kind,
            provider: Some(backend),
            cached,
        }
    }

    /// The flagged stand-in returned when every backend fails.
    pub fn placeholder(&self, context: &str) -> Value {
        let mut fields = match self.placeholders.get(context) {
            Some(Value::Object(template)) => template.clone(),
            Some(other) => {
                let mut wrapped = Map::new();
                wrapped.insert("data".to_string(), other.clone());
                wrapped
            }
            None => Map::new(),
        };
        fields.insert(PLACEHOLDER_FLAG.to_string(), Value::Bool(true));
        fields.insert(
            PLACEHOLDER_NOTICE_KEY.to_string(),
            Value::String(PLACEHOLDER_NOTICE.to_string()),
        );
        fields.insert("context".to_string(), Value::String(context.to_string()));
        Value::Object(fields)
    }
}

impl fmt::Debug for ProviderCascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCascade")
            .field("backends", &self.backend_names())
            .field("cached", &self.cache.is_some())
            .field("placeholder_contexts", &self.placeholders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StaticBackend;
    use serde_json::json;

    #[tokio::test]
    async fn later_backends_only_run_after_failures() {
        let primary = Arc::new(StaticBackend::failing("primary"));
        let secondary = Arc::new(StaticBackend::ok("secondary", "{\"score\": 7}"));
        let tertiary = Arc::new(StaticBackend::ok("tertiary", "unused"));
        let backends: Vec<Arc<dyn ProviderBackend>> =
            vec![primary.clone(), secondary.clone(), tertiary.clone()];
        let cascade = ProviderCascade::new(backends);

        let response = cascade.call("prompt").await;

        assert_eq!(response.kind, ResponseKind::Structured);
        assert_eq!(response.value, json!({"score": 7}));
        assert_eq!(response.provider.as_deref(), Some("secondary"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(tertiary.calls(), 0);
    }

    #[tokio::test]
    async fn prose_responses_are_wrapped() {
        let backends: Vec<Arc<dyn ProviderBackend>> =
            vec![Arc::new(StaticBackend::ok("only", "calm and open"))];
        let cascade = ProviderCascade::new(backends);
        let response = cascade.call("prompt").await;
        assert_eq!(response.kind, ResponseKind::Text);
        assert_eq!(response.value, json!({"text": "calm and open"}));
    }

    #[tokio::test]
    async fn exhaustion_yields_flagged_placeholder_with_template() {
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![
            Arc::new(StaticBackend::failing("a")),
            Arc::new(StaticBackend::failing("b")),
            Arc::new(StaticBackend::failing("c")),
        ];
        let cascade = ProviderCascade::new(backends)
            .with_placeholder("surface", json!({"emotional_tone": "balanced"}));

        let response = cascade.call_in("surface", "prompt").await;

        assert!(response.is_placeholder());
        assert_eq!(response.provider, None);
        assert_eq!(response.value[PLACEHOLDER_FLAG], json!(true));
        assert_eq!(response.value["emotional_tone"], json!("balanced"));
        assert_eq!(response.value["context"], json!("surface"));
        assert!(response.value[PLACEHOLDER_NOTICE_KEY].is_string());
    }

    #[tokio::test]
    async fn empty_cascade_is_a_placeholder() {
        let response = ProviderCascade::new(Vec::new()).call("prompt").await;
        assert!(response.is_placeholder());
        assert_eq!(response.value["context"], json!(DEFAULT_CONTEXT));
    }

    #[tokio::test]
    async fn cache_suppresses_repeat_calls_but_not_placeholders() {
        let backend = Arc::new(StaticBackend::ok("only", "{\"a\": 1}"));
        let cache = Arc::new(ResponseCache::new(8, None));
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![backend.clone()];
        let cascade = ProviderCascade::new(backends).with_cache(Arc::clone(&cache));

        let first = cascade.call("same prompt").await;
        let second = cascade.call("same prompt").await;
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.value, second.value);
        assert_eq!(backend.calls(), 1);

        let down: Vec<Arc<dyn ProviderBackend>> = vec![Arc::new(StaticBackend::failing("down"))];
        let failing = ProviderCascade::new(down).with_cache(Arc::clone(&cache));
        failing.call("other prompt").await;
        assert!(cache.get("other prompt").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_calls_share_the_cache_safely() {
        let backend = Arc::new(StaticBackend::ok("only", "text"));
        let backends: Vec<Arc<dyn ProviderBackend>> = vec![backend.clone()];
        let cascade = Arc::new(
            ProviderCascade::new(backends).with_cache(Arc::new(ResponseCache::new(8, None))),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cascade = Arc::clone(&cascade);
                tokio::spawn(async move { cascade.call(&format!("prompt {}", i % 2)).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().value, json!({"text": "text"}));
        }
        assert!(backend.calls() >= 2);
        assert!(backend.calls() <= 8);
    }
}
