// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use super::{
    FixedBackend, GeminiBackend, OllamaBackend, OpenRouterBackend, ProviderBackend,
    ProviderCascade, ResponseCache,
};
use crate::config::{BackendConfig, CascadeConfig};
use crate::errors::{ConfigError, ProviderError};

/// Builds provider backends and cascades from configuration.
pub struct BackendFactory;

impl BackendFactory {
    /// Create one backend from its config entry.
    ///
    /// Hosted backends read their API key from the environment variable the
    /// entry names. A missing key is not an error here: the backend is built
    /// and reports `NotConfigured` when called, so the cascade skips it.
    pub fn create(config: &BackendConfig) -> Result<Arc<dyn ProviderBackend>, ConfigError> {
        let backend: Arc<dyn ProviderBackend> = match config {
            BackendConfig::Gemini {
                base_url,
                model,
                api_key_env,
                timeout_seconds,
            } => Arc::new(
                GeminiBackend::new(
                    base_url.as_str(),
                    model.as_str(),
                    std::env::var(api_key_env).ok(),
                    Duration::from_secs(*timeout_seconds),
                )
                .map_err(|e| backend_error(config, e))?,
            ),
            BackendConfig::OpenRouter {
                base_url,
                model,
                api_key_env,
                timeout_seconds,
            } => Arc::new(
                OpenRouterBackend::new(
                    base_url.as_str(),
                    model.as_str(),
                    std::env::var(api_key_env).ok(),
                    Duration::from_secs(*timeout_seconds),
                )
                .map_err(|e| backend_error(config, e))?,
            ),
            BackendConfig::Ollama {
                url,
                model,
                timeout_seconds,
            } => Arc::new(
                OllamaBackend::new(
                    url.as_str(),
                    model.as_str(),
                    Duration::from_secs(*timeout_seconds),
                )
                .map_err(|e| backend_error(config, e))?,
            ),
            BackendConfig::Fixed { name, response } => {
                Arc::new(FixedBackend::new(name.as_str(), response.as_str()))
            }
        };
        Ok(backend)
    }

    /// Create the whole chain, in order, plus its cache when configured.
    pub fn create_cascade(config: &CascadeConfig) -> Result<ProviderCascade, ConfigError> {
        let backends = config
            .backends
            .iter()
            .map(Self::create)
            .collect::<Result<Vec<_>, _>>()?;

        let mut cascade = ProviderCascade::new(backends);
        if let Some(cache) = &config.cache {
            cascade = cascade.with_cache(Arc::new(ResponseCache::new(cache.capacity, cache.ttl())));
        }
        Ok(cascade)
    }
}

fn backend_error(config: &BackendConfig, error: ProviderError) -> ConfigError {
    ConfigError::Backend {
        backend: config.label().to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    #[test]
    fn builds_backends_in_configured_order() {
        let config = CascadeConfig {
            backends: vec![
                BackendConfig::Fixed {
                    name: "canned".to_string(),
                    response: "{}".to_string(),
                },
                BackendConfig::Ollama {
                    url: "http://localhost:11434".to_string(),
                    model: "llama3.2".to_string(),
                    timeout_seconds: 5,
                },
                BackendConfig::Gemini {
                    base_url: "http://localhost:1".to_string(),
                    model: "gemini-2.0-flash".to_string(),
                    api_key_env: "LAYERCAKE_TEST_UNSET_KEY".to_string(),
                    timeout_seconds: 5,
                },
            ],
            cache: Some(CacheConfig::default()),
        };

        let cascade = BackendFactory::create_cascade(&config).unwrap();
        assert_eq!(cascade.backend_names(), ["canned", "ollama", "gemini"]);
    }

    #[tokio::test]
    async fn missing_api_key_surfaces_on_call() {
        let backend = BackendFactory::create(&BackendConfig::OpenRouter {
            base_url: "http://localhost:1".to_string(),
            model: "m".to_string(),
            api_key_env: "LAYERCAKE_TEST_UNSET_KEY".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();

        let err = backend.generate("hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn fixed_backend_from_config() {
        let backend = BackendFactory::create(&BackendConfig::Fixed {
            name: "offline".to_string(),
            response: "canned".to_string(),
        })
        .unwrap();
        assert_eq!(backend.name(), "offline");
        assert_eq!(backend.generate("anything").await.unwrap(), "canned");
    }
}
