// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for task lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Task registration
//! * Attempt start, retry and timeout
//! * Terminal settlement (completed or failed)

use crate::engine::{Phase, Priority, TaskId};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Task registered with the dispatcher.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct TaskRegistered<'a> {
    pub task_id: &'a TaskId,
    pub task_name: &'a str,
    pub phase: Phase,
    pub priority: Priority,
}

impl Display for TaskRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Registered task '{}' ({}) in {} with priority {}",
            self.task_name, self.task_id, self.phase, self.priority
        )
    }
}

impl StructuredLog for TaskRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            task_id = %self.task_id,
            task_name = self.task_name,
            phase = %self.phase,
            priority = self.priority.value(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_registered",
            span_name = name,
            task_name = self.task_name,
            phase = %self.phase,
        )
    }
}

/// Task launched for the first time in its phase.
///
/// # Log Level
/// `debug!` - Diagnostic detail
///
/// # Example
/// ```
/// use the_layercake::observability::messages::task::TaskLaunched;
/// use the_layercake::engine::{Phase, Priority, TaskId};
/// use std::time::Duration;
///
/// let id = TaskId::from("task-1");
/// let msg = TaskLaunched {
///     task_id: &id,
///     task_name: "surface_analysis",
///     phase: Phase::Phase1,
///     priority: Priority::CRITICAL,
///     timeout: Duration::from_secs(30),
///     max_attempts: 3,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TaskLaunched<'a> {
    pub task_id: &'a TaskId,
    pub task_name: &'a str,
    pub phase: Phase,
    pub priority: Priority,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Display for TaskLaunched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' launched: timeout={:?}, max_attempts={}",
            self.task_name, self.timeout, self.max_attempts
        )
    }
}

impl StructuredLog for TaskLaunched<'_> {
    fn log(&self) {
        tracing::debug!(
            task_id = %self.task_id,
            task_name = self.task_name,
            phase = %self.phase,
            timeout_ms = self.timeout.as_millis() as u64,
            max_attempts = self.max_attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "task",
            span_name = name,
            task_id = %self.task_id,
            task_name = self.task_name,
            phase = %self.phase,
            priority = self.priority.value(),
        )
    }
}

/// An attempt failed and the task will run again.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct TaskRetrying<'a> {
    pub task_name: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: &'a dyn std::error::Error,
}

impl Display for TaskRetrying<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' attempt {}/{} failed, retrying in {:?}: {}",
            self.task_name, self.attempt, self.max_attempts, self.delay, self.error
        )
    }
}

impl StructuredLog for TaskRetrying<'_> {
    fn log(&self) {
        tracing::warn!(
            task_name = self.task_name,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "task_retrying",
            span_name = name,
            task_name = self.task_name,
            attempt = self.attempt,
        )
    }
}

/// The attempt's deadline passed; the executor was signalled and abandoned.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct TaskAbandoned<'a> {
    pub task_name: &'a str,
    pub attempt: u32,
    pub timeout: Duration,
}

impl Display for TaskAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' attempt {} exceeded {:?}; cancellation signalled and work abandoned",
            self.task_name, self.attempt, self.timeout
        )
    }
}

impl StructuredLog for TaskAbandoned<'_> {
    fn log(&self) {
        tracing::warn!(
            task_name = self.task_name,
            attempt = self.attempt,
            timeout_ms = self.timeout.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "task_abandoned",
            span_name = name,
            task_name = self.task_name,
            attempt = self.attempt,
        )
    }
}

/// Task completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TaskSucceeded<'a> {
    pub task_name: &'a str,
    pub attempts: u32,
    pub duration: Duration,
}

impl Display for TaskSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' completed in {:?} (attempts={})",
            self.task_name, self.duration, self.attempts
        )
    }
}

impl StructuredLog for TaskSucceeded<'_> {
    fn log(&self) {
        tracing::info!(
            task_name = self.task_name,
            attempts = self.attempts,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "task_succeeded",
            span_name = name,
            task_name = self.task_name,
            attempts = self.attempts,
        )
    }
}

/// Task exhausted its retry budget.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_layercake::observability::messages::task::TaskExhausted;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
/// let msg = TaskExhausted {
///     task_name: "deep_analysis",
///     attempts: 3,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct TaskExhausted<'a> {
    pub task_name: &'a str,
    pub attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for TaskExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' failed after {} attempts: {}",
            self.task_name, self.attempts, self.error
        )
    }
}

impl StructuredLog for TaskExhausted<'_> {
    fn log(&self) {
        tracing::error!(
            task_name = self.task_name,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "task_exhausted",
            span_name = name,
            task_name = self.task_name,
            attempts = self.attempts,
        )
    }
}
