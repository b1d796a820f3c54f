// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors returned by individual text-generation backends.
//!
//! A `ProviderCascade` absorbs all of these; they only surface in logs and in
//! the cascade's failure list.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend is missing something it needs (key, url, model).
    #[error("backend '{backend}' is not configured: {reason}")]
    NotConfigured { backend: String, reason: String },

    /// The request never produced an HTTP response.
    #[error("backend '{backend}' transport error: {source}")]
    Transport {
        backend: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("backend '{backend}' returned HTTP {status}: {body}")]
    Status {
        backend: String,
        status: u16,
        body: String,
    },

    /// The backend answered but the body did not have the expected shape.
    #[error("backend '{backend}' returned a malformed response: {reason}")]
    MalformedResponse { backend: String, reason: String },

    /// The backend refused the call outright.
    #[error("backend '{backend}' is unavailable: {reason}")]
    Unavailable { backend: String, reason: String },
}

impl ProviderError {
    pub fn unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}
