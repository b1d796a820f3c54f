// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod handler;
mod pipeline;
mod provider;
mod registration;

pub use config::ConfigError;
pub use execution::{DispatchError, TaskError};
pub use handler::{
    CriticalError, ErrorContext, ErrorHandler, ErrorHandlerOptions, ErrorRecord, ErrorSummary,
    Severity,
};
pub use pipeline::PipelineError;
pub use provider::ProviderError;
pub use registration::RegistrationError;
