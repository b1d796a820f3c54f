// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{ConfigError, DispatchError, RegistrationError};

/// Errors surfaced by the profiling pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller's input was rejected before any task ran
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The pipeline could not be assembled from configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pipeline's own task graph failed to register
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The dispatch run was aborted
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("failed to encode pipeline input: {0}")]
    Encoding(#[from] serde_json::Error),
}
