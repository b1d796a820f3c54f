// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while running tasks and whole dispatch runs.

use std::time::Duration;
use thiserror::Error;

use crate::engine::Phase;

/// Why a single task attempt failed.
///
/// These never escape `Dispatcher::dispatch` on their own: a task that keeps
/// failing past its retry budget is recorded as `failed` and left out of the
/// result map.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    /// The executor did not settle before the attempt's deadline.
    #[error("task '{task_name}' timed out after {}ms", timeout.as_millis())]
    TimedOut {
        task_name: String,
        timeout: Duration,
    },

    /// The executor returned an error.
    #[error("task '{task_name}' failed: {message}")]
    Execution { task_name: String, message: String },

    /// The executor panicked instead of returning.
    #[error("task '{task_name}' panicked: {message}")]
    Panicked { task_name: String, message: String },
}

impl TaskError {
    pub fn task_name(&self) -> &str {
        match self {
            TaskError::TimedOut { task_name, .. }
            | TaskError::Execution { task_name, .. }
            | TaskError::Panicked { task_name, .. } => task_name,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::TimedOut { .. })
    }
}

/// Errors that abort a dispatch run instead of producing a partial result.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A task failure was reported as critical and the error handler is
    /// configured to escalate critical failures.
    #[error("critical failure in task '{task_name}' during {phase}: {message}")]
    Critical {
        task_name: String,
        phase: Phase,
        message: String,
    },

    /// The dispatcher's own bookkeeping broke (lost task, closed semaphore).
    #[error("internal dispatcher error: {message}")]
    Internal { message: String },
}
