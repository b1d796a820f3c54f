// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for profiling runs.
//!
//! This module contains message types for logging events related to:
//! * Profile run start and completion
//! * Input rejection and aborted runs

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

use crate::observability::messages::StructuredLog;

/// Profiling run started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProfileStarted<'a> {
    pub session_id: &'a str,
    pub message_count: usize,
    pub cultural_context: &'a str,
}

impl Display for ProfileStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Profiling session {}: {} messages, {} context",
            self.session_id, self.message_count, self.cultural_context
        )
    }
}

impl StructuredLog for ProfileStarted<'_> {
    fn log(&self) {
        tracing::info!(
            session_id = self.session_id,
            message_count = self.message_count,
            cultural_context = self.cultural_context,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "profile",
            span_name = name,
            session_id = self.session_id,
            cultural_context = self.cultural_context,
        )
    }
}

/// Profiling run produced a report.
///
/// # Log Level
/// `info!` for a complete profile, `warn!` when analyses are missing or
/// were answered with placeholder data
pub struct ProfileCompleted<'a> {
    pub session_id: &'a str,
    pub duration: Duration,
    pub missing: &'a [String],
    pub degraded: &'a [String],
}

impl Display for ProfileCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Profiling session {} finished in {:?}",
            self.session_id, self.duration
        )?;
        if !self.missing.is_empty() {
            write!(f, "; missing: {}", self.missing.join(", "))?;
        }
        if !self.degraded.is_empty() {
            write!(f, "; placeholder data: {}", self.degraded.join(", "))?;
        }
        Ok(())
    }
}

impl StructuredLog for ProfileCompleted<'_> {
    fn log(&self) {
        let duration_ms = self.duration.as_millis() as u64;
        if self.missing.is_empty() && self.degraded.is_empty() {
            tracing::info!(session_id = self.session_id, duration_ms, "{}", self);
        } else {
            tracing::warn!(
                session_id = self.session_id,
                duration_ms,
                missing = self.missing.len(),
                degraded = self.degraded.len(),
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "profile_completed",
            span_name = name,
            session_id = self.session_id,
        )
    }
}

/// The caller's input was rejected before dispatch.
///
/// # Log Level
/// `warn!` - Caller error, nothing ran
pub struct InputRejected<'a> {
    pub session_id: &'a str,
    pub reason: &'a str,
}

impl Display for InputRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Profiling session {} rejected its input: {}",
            self.session_id, self.reason
        )
    }
}

impl StructuredLog for InputRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            session_id = self.session_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "input_rejected",
            span_name = name,
            session_id = self.session_id,
        )
    }
}

/// Dispatch aborted; no report is produced.
///
/// # Log Level
/// `error!` - The run failed
pub struct ProfileAborted<'a> {
    pub session_id: &'a str,
    pub error: &'a dyn Error,
}

impl Display for ProfileAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Profiling session {} aborted: {}",
            self.session_id, self.error
        )
    }
}

impl StructuredLog for ProfileAborted<'_> {
    fn log(&self) {
        tracing::error!(
            session_id = self.session_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "profile_aborted",
            span_name = name,
            session_id = self.session_id,
            error = %self.error,
        )
    }
}
