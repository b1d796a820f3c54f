// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Text-generation backends and the cascade that strings them together.
//!
//! Analysis tasks never talk to a single model service. They ask a
//! [`ProviderCascade`], which tries an ordered list of [`ProviderBackend`]s
//! and returns the first success, parsed into JSON where possible. When every
//! backend fails the cascade answers with a flagged placeholder instead of an
//! error, so a model outage degrades a profile rather than failing it.
//!
//! # Available Backends
//!
//! - **Gemini**: Google's `generateContent` REST API
//! - **OpenRouter**: OpenAI-compatible chat completions
//! - **Ollama**: a local Ollama server's `/api/generate`
//! - **Fixed**: a canned response, for offline runs and demos
//!
//! ## Stub Backend (Test-Only)
//! Scripted executors and backends for engine and cascade tests. Not
//! available in production builds.
//!
//! # Architecture
//!
//! ```text
//! Configuration → BackendFactory → ProviderCascade → task executors
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use the_layercake::backends::{FixedBackend, ProviderBackend, ProviderCascade, ResponseKind};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let backends: Vec<Arc<dyn ProviderBackend>> =
//!     vec![Arc::new(FixedBackend::new("offline", r#"{"mood": "calm"}"#))];
//! let cascade = ProviderCascade::new(backends);
//!
//! let response = cascade.call("Describe the user's mood").await;
//! assert_eq!(response.kind, ResponseKind::Structured);
//! assert_eq!(response.value["mood"], "calm");
//! # }
//! ```

mod cache;
mod cascade;
mod factory;
mod fixed;
mod gemini;
mod http;
mod ollama;
mod openrouter;
mod parse;
mod provider;
#[cfg(test)]
pub mod stub;

pub use cache::{CachedResponse, ResponseCache};
pub use cascade::{
    CascadeResponse, ProviderCascade, ResponseKind, DEFAULT_CONTEXT, PLACEHOLDER_FLAG,
    PLACEHOLDER_NOTICE, PLACEHOLDER_NOTICE_KEY,
};
pub use factory::BackendFactory;
pub use fixed::FixedBackend;
pub use gemini::GeminiBackend;
pub use ollama::OllamaBackend;
pub use openrouter::OpenRouterBackend;
pub use parse::parse_response;
pub use provider::ProviderBackend;
