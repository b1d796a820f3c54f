// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the error handler and event listeners.

use crate::errors::Severity;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An error was stored by the error handler.
///
/// Logged at a level matching its severity.
///
/// # Example
/// ```
/// use the_layercake::observability::messages::diagnostics::ErrorRecorded;
/// use the_layercake::errors::Severity;
///
/// let msg = ErrorRecorded {
///     task_name: Some("synthesis"),
///     stage: None,
///     severity: Severity::Critical,
///     message: "task 'synthesis' timed out after 30000ms",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ErrorRecorded<'a> {
    pub task_name: Option<&'a str>,
    pub stage: Option<&'a str>,
    pub severity: Severity,
    pub message: &'a str,
}

impl Display for ErrorRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let origin = self.task_name.or(self.stage).unwrap_or("unknown");
        write!(f, "[{}] {}: {}", self.severity, origin, self.message)
    }
}

impl StructuredLog for ErrorRecorded<'_> {
    fn log(&self) {
        let task_name = self.task_name.unwrap_or_default();
        let stage = self.stage.unwrap_or_default();
        match self.severity {
            Severity::Info => tracing::info!(task_name, stage, severity = %self.severity, "{}", self),
            Severity::Warning => {
                tracing::warn!(task_name, stage, severity = %self.severity, "{}", self)
            }
            Severity::Error | Severity::Critical => {
                tracing::error!(task_name, stage, severity = %self.severity, "{}", self)
            }
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "error_recorded",
            span_name = name,
            task_name = self.task_name.unwrap_or_default(),
            severity = %self.severity,
        )
    }
}

/// An event listener panicked; the panic was contained.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct ListenerPanicked<'a> {
    pub event: &'a str,
    pub message: &'a str,
}

impl Display for ListenerPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Listener for '{}' panicked and was ignored: {}",
            self.event, self.message
        )
    }
}

impl StructuredLog for ListenerPanicked<'_> {
    fn log(&self) {
        tracing::warn!(event = self.event, message = self.message, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("listener_panicked", span_name = name, event = self.event)
    }
}
