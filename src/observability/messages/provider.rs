// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the provider cascade.
//!
//! This module contains message types for logging events related to:
//! * Backend attempts and failures
//! * Response cache hits
//! * Cascade exhaustion and placeholder substitution

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A backend is about to be asked for a completion.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct BackendAttempt<'a> {
    pub context: &'a str,
    pub backend: &'a str,
    pub position: usize,
    pub backend_count: usize,
}

impl Display for BackendAttempt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] trying backend '{}' ({}/{})",
            self.context,
            self.backend,
            self.position + 1,
            self.backend_count
        )
    }
}

impl StructuredLog for BackendAttempt<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            backend = self.backend,
            position = self.position,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "backend_attempt",
            span_name = name,
            context = self.context,
            backend = self.backend,
        )
    }
}

/// A backend answered successfully.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct BackendResponded<'a> {
    pub context: &'a str,
    pub backend: &'a str,
    pub response_len: usize,
    pub duration: Duration,
}

impl Display for BackendResponded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] backend '{}' responded with {} bytes in {:?}",
            self.context, self.backend, self.response_len, self.duration
        )
    }
}

impl StructuredLog for BackendResponded<'_> {
    fn log(&self) {
        tracing::debug!(
            context = self.context,
            backend = self.backend,
            response_len = self.response_len,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "backend_responded",
            span_name = name,
            context = self.context,
            backend = self.backend,
        )
    }
}

/// A backend failed; the cascade moves on to the next one.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
///
/// # Example
/// ```
/// use the_layercake::observability::messages::provider::BackendFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
/// let msg = BackendFailed {
///     context: "deep_analysis",
///     backend: "ollama",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct BackendFailed<'a> {
    pub context: &'a str,
    pub backend: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for BackendFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] backend '{}' failed: {}",
            self.context, self.backend, self.error
        )
    }
}

impl StructuredLog for BackendFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            context = self.context,
            backend = self.backend,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "backend_failed",
            span_name = name,
            context = self.context,
            backend = self.backend,
        )
    }
}

/// Response served from the cache without calling any backend.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct CacheHit<'a> {
    pub context: &'a str,
    pub backend: &'a str,
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] cache hit (originally from '{}')",
            self.context, self.backend
        )
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::debug!(context = self.context, backend = self.backend, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("cache_hit", span_name = name, context = self.context)
    }
}

/// Every backend failed and the placeholder was substituted.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct CascadeExhausted<'a> {
    pub context: &'a str,
    pub backend_count: usize,
}

impl Display for CascadeExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] all {} backends failed; returning placeholder response",
            self.context, self.backend_count
        )
    }
}

impl StructuredLog for CascadeExhausted<'_> {
    fn log(&self) {
        tracing::warn!(
            context = self.context,
            backend_count = self.backend_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "cascade_exhausted",
            span_name = name,
            context = self.context,
            backend_count = self.backend_count,
        )
    }
}
