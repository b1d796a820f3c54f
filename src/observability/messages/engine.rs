// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for dispatcher lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Dispatch run start, completion and abort
//! * Phase start, skip and completion (barrier settlement)

use crate::engine::Phase;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Dispatch run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_layercake::observability::messages::engine::DispatchStarted;
///
/// let msg = DispatchStarted {
///     task_count: 12,
///     phase_count: 3,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct DispatchStarted {
    pub task_count: usize,
    pub phase_count: usize,
}

impl Display for DispatchStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting dispatch: {} tasks across {} phases",
            self.task_count, self.phase_count
        )
    }
}

impl StructuredLog for DispatchStarted {
    fn log(&self) {
        tracing::info!(
            task_count = self.task_count,
            phase_count = self.phase_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dispatch",
            span_name = name,
            task_count = self.task_count,
            phase_count = self.phase_count,
        )
    }
}

/// Phase started; every task in it is about to launch.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PhaseStarted {
    pub phase: Phase,
    pub task_count: usize,
}

impl Display for PhaseStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Phase {} started: {} tasks",
            self.phase, self.task_count
        )
    }
}

impl StructuredLog for PhaseStarted {
    fn log(&self) {
        tracing::info!(
            phase = %self.phase,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "phase",
            span_name = name,
            phase = %self.phase,
            task_count = self.task_count,
        )
    }
}

/// Phase had no registered tasks.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct PhaseSkipped {
    pub phase: Phase,
}

impl Display for PhaseSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Phase {}: no tasks, skipping", self.phase)
    }
}

impl StructuredLog for PhaseSkipped {
    fn log(&self) {
        tracing::debug!(phase = %self.phase, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("phase_skipped", span_name = name, phase = %self.phase)
    }
}

/// Every task in a phase has settled.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_layercake::observability::messages::engine::PhaseCompleted;
/// use the_layercake::engine::Phase;
/// use std::time::Duration;
///
/// let msg = PhaseCompleted {
///     phase: Phase::Phase2,
///     task_count: 6,
///     success_count: 5,
///     duration: Duration::from_millis(420),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PhaseCompleted {
    pub phase: Phase,
    pub task_count: usize,
    pub success_count: usize,
    pub duration: Duration,
}

impl Display for PhaseCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Phase {} completed in {:?}: {}/{} tasks succeeded",
            self.phase, self.duration, self.success_count, self.task_count
        )
    }
}

impl StructuredLog for PhaseCompleted {
    fn log(&self) {
        tracing::info!(
            phase = %self.phase,
            task_count = self.task_count,
            success_count = self.success_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "phase_completed",
            span_name = name,
            phase = %self.phase,
            task_count = self.task_count,
            success_count = self.success_count,
            duration = ?self.duration,
        )
    }
}

/// Dispatch run finished (possibly with failed tasks).
///
/// # Log Level
/// `info!` - Important operational event
pub struct DispatchCompleted {
    pub success: bool,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub success_rate: f64,
    pub duration: Duration,
}

impl Display for DispatchCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatch completed in {:?}: {}/{} tasks completed, {} failed ({:.1}% success)",
            self.duration,
            self.completed_tasks,
            self.total_tasks,
            self.failed_tasks,
            self.success_rate * 100.0
        )
    }
}

impl StructuredLog for DispatchCompleted {
    fn log(&self) {
        tracing::info!(
            success = self.success,
            total_tasks = self.total_tasks,
            completed_tasks = self.completed_tasks,
            failed_tasks = self.failed_tasks,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dispatch_completed",
            span_name = name,
            success = self.success,
            failed_tasks = self.failed_tasks,
            duration = ?self.duration,
        )
    }
}

/// Dispatch run aborted by a critical failure.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_layercake::observability::messages::engine::DispatchAborted;
/// use the_layercake::engine::Phase;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
/// let msg = DispatchAborted {
///     phase: Phase::Synthesis,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct DispatchAborted<'a> {
    pub phase: Phase,
    pub error: &'a dyn std::error::Error,
}

impl Display for DispatchAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dispatch aborted during {}: {}", self.phase, self.error)
    }
}

impl StructuredLog for DispatchAborted<'_> {
    fn log(&self) {
        tracing::error!(
            phase = %self.phase,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "dispatch_aborted",
            span_name = name,
            phase = %self.phase,
            error = %self.error,
        )
    }
}
