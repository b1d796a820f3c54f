// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{
    DEFAULT_BACKEND_TIMEOUT_SECONDS, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECONDS,
    DEFAULT_GEMINI_API_KEY_ENV, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL, DEFAULT_OPENROUTER_API_KEY_ENV, DEFAULT_OPENROUTER_BASE_URL,
    DEFAULT_OPENROUTER_MODEL,
};
use crate::engine::DispatcherOptions;
use crate::errors::{ConfigError, ErrorHandlerOptions};
use crate::pipeline::PipelineOptions;

/// Complete configuration for a profiling run.
///
/// Every section is optional; an empty file yields the defaults.
///
/// # Example
/// ```yaml
/// dispatcher:
///   max_concurrent: 4
///   default_timeout_ms: 30000
/// error_handler:
///   throw_on_critical: true
/// cascade:
///   cache: { capacity: 128, ttl_seconds: 300 }
///   backends:
///     - type: ollama
///       url: http://localhost:11434
///       model: llama3.2
/// pipeline:
///   cultural_context: eastern
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dispatcher: DispatcherOptions,
    pub error_handler: ErrorHandlerOptions,
    pub cascade: CascadeConfig,
    pub pipeline: PipelineOptions,
}

/// The ordered backend chain plus the optional response cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Tried first to last; the first success wins.
    pub backends: Vec<BackendConfig>,
    /// `None` disables caching.
    pub cache: Option<CacheConfig>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            backends: vec![
                BackendConfig::Gemini {
                    base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                    model: DEFAULT_GEMINI_MODEL.to_string(),
                    api_key_env: DEFAULT_GEMINI_API_KEY_ENV.to_string(),
                    timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECONDS,
                },
                BackendConfig::OpenRouter {
                    base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
                    model: DEFAULT_OPENROUTER_MODEL.to_string(),
                    api_key_env: DEFAULT_OPENROUTER_API_KEY_ENV.to_string(),
                    timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECONDS,
                },
                BackendConfig::Ollama {
                    url: DEFAULT_OLLAMA_URL.to_string(),
                    model: DEFAULT_OLLAMA_MODEL.to_string(),
                    timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECONDS,
                },
            ],
            cache: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
    /// Entry lifetime; `0` keeps entries until they are evicted.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_seconds > 0).then(|| Duration::from_secs(self.ttl_seconds))
    }
}

/// One entry of the backend chain, selected by its `type` tag.
///
/// API keys are never stored in the file; `api_key_env` names the
/// environment variable they are read from when the backend is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    Gemini {
        #[serde(default = "default_gemini_base_url")]
        base_url: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default = "default_gemini_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    #[serde(rename = "openrouter")]
    OpenRouter {
        #[serde(default = "default_openrouter_base_url")]
        base_url: String,
        #[serde(default = "default_openrouter_model")]
        model: String,
        #[serde(default = "default_openrouter_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_timeout_seconds")]
        timeout_seconds: u64,
    },
    /// Canned response, useful for offline runs and demos.
    Fixed { name: String, response: String },
}

impl BackendConfig {
    /// Label used in validation messages.
    pub fn label(&self) -> &str {
        match self {
            BackendConfig::Gemini { .. } => "gemini",
            BackendConfig::OpenRouter { .. } => "openrouter",
            BackendConfig::Ollama { .. } => "ollama",
            BackendConfig::Fixed { name, .. } => name,
        }
    }
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_gemini_api_key_env() -> String {
    DEFAULT_GEMINI_API_KEY_ENV.to_string()
}

fn default_openrouter_base_url() -> String {
    DEFAULT_OPENROUTER_BASE_URL.to_string()
}

fn default_openrouter_model() -> String {
    DEFAULT_OPENROUTER_MODEL.to_string()
}

fn default_openrouter_api_key_env() -> String {
    DEFAULT_OPENROUTER_API_KEY_ENV.to_string()
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_SECONDS
}

impl Config {
    /// Reject values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dispatcher = &self.dispatcher;
        if dispatcher.max_concurrent == Some(0) {
            return Err(ConfigError::invalid(
                "dispatcher.max_concurrent",
                "must be at least 1 when set",
            ));
        }
        if dispatcher.default_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "dispatcher.default_timeout_ms",
                "must be greater than zero",
            ));
        }
        if dispatcher.retry_multiplier.is_nan() || dispatcher.retry_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "dispatcher.retry_multiplier",
                format!("must be at least 1.0, got {}", dispatcher.retry_multiplier),
            ));
        }

        if self.error_handler.max_errors == 0 {
            return Err(ConfigError::invalid(
                "error_handler.max_errors",
                "must be greater than zero",
            ));
        }

        if let Some(cache) = &self.cascade.cache {
            if cache.capacity == 0 {
                return Err(ConfigError::invalid(
                    "cascade.cache.capacity",
                    "must be greater than zero",
                ));
            }
        }

        for (index, backend) in self.cascade.backends.iter().enumerate() {
            validate_backend(index, backend)?;
        }

        Ok(())
    }
}

fn validate_backend(index: usize, backend: &BackendConfig) -> Result<(), ConfigError> {
    let field = |name: &str| format!("cascade.backends[{index}].{name}");
    let required = |name: &str, value: &str| {
        if value.trim().is_empty() {
            Err(ConfigError::invalid(field(name), "must not be empty"))
        } else {
            Ok(())
        }
    };
    let positive = |value: u64| {
        if value == 0 {
            Err(ConfigError::invalid(
                field("timeout_seconds"),
                "must be greater than zero",
            ))
        } else {
            Ok(())
        }
    };

    match backend {
        BackendConfig::Gemini {
            base_url,
            model,
            api_key_env,
            timeout_seconds,
        }
        | BackendConfig::OpenRouter {
            base_url,
            model,
            api_key_env,
            timeout_seconds,
        } => {
            required("base_url", base_url)?;
            required("model", model)?;
            required("api_key_env", api_key_env)?;
            positive(*timeout_seconds)
        }
        BackendConfig::Ollama {
            url,
            model,
            timeout_seconds,
        } => {
            required("url", url)?;
            required("model", model)?;
            positive(*timeout_seconds)
        }
        BackendConfig::Fixed { name, .. } => required("name", name),
    }
}

/// Load a config file. Files ending in `.toml` are read as TOML, anything
/// else as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        Ok(toml::from_str(&content)?)
    } else if content.trim().is_empty() {
        // serde_yaml rejects an empty document
        Ok(Config::default())
    } else {
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Load a config file and reject out-of-range values.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CulturalContext;

    #[test]
    fn parse_full_config() {
        let yaml = r#"
dispatcher:
  max_concurrent: 4
  default_timeout_ms: 1000
  retry_failed_tasks: false
error_handler:
  max_errors: 10
  throw_on_critical: false
cascade:
  cache: { capacity: 8 }
  backends:
    - type: ollama
      model: mistral
    - type: fixed
      name: offline
      response: '{"note": "canned"}'
pipeline:
  cultural_context: african
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.dispatcher.max_concurrent, Some(4));
        assert_eq!(cfg.dispatcher.default_timeout_ms, 1000);
        assert!(!cfg.dispatcher.retry_failed_tasks);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.dispatcher.default_retries, 2);
        assert_eq!(cfg.error_handler.max_errors, 10);
        assert!(cfg.error_handler.log_to_console);
        assert_eq!(
            cfg.cascade.cache,
            Some(CacheConfig {
                capacity: 8,
                ttl_seconds: DEFAULT_CACHE_TTL_SECONDS
            })
        );
        assert_eq!(
            cfg.cascade.backends[0],
            BackendConfig::Ollama {
                url: DEFAULT_OLLAMA_URL.to_string(),
                model: "mistral".to_string(),
                timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECONDS,
            }
        );
        assert_eq!(cfg.cascade.backends[1].label(), "offline");
        assert_eq!(cfg.pipeline.cultural_context, CulturalContext::African);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_chain_prefers_hosted_backends() {
        let labels: Vec<_> = CascadeConfig::default()
            .backends
            .iter()
            .map(|b| b.label().to_string())
            .collect();
        assert_eq!(labels, ["gemini", "openrouter", "ollama"]);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let cfg: Config = serde_yaml::from_str("dispatcher: { max_concurrent: 0 }").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "dispatcher.max_concurrent"));
    }

    #[test]
    fn rejects_shrinking_backoff() {
        let cfg: Config = serde_yaml::from_str("dispatcher: { retry_multiplier: 0.5 }").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_backend_fields() {
        let yaml = r#"
cascade:
  backends:
    - type: ollama
      url: ""
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration for 'cascade.backends[0].url': must not be empty"
        );
    }

    #[test]
    fn rejects_zero_cache_capacity() {
        let cfg: Config = serde_yaml::from_str("cascade: { cache: { capacity: 0 } }").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        let cache = CacheConfig {
            capacity: 1,
            ttl_seconds: 0,
        };
        assert_eq!(cache.ttl(), None);
        assert_eq!(CacheConfig::default().ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn unknown_backend_type_is_a_parse_error() {
        let yaml = "cascade: { backends: [ { type: carrier_pigeon } ] }";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
