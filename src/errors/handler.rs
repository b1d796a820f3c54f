// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded, append-only error log shared by a pipeline run.
//!
//! The handler is purely diagnostic with one exception: when configured with
//! `throw_on_critical`, handling an error tagged [`Severity::Critical`] returns
//! [`CriticalError`], which the dispatcher turns into an aborted run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::engine::Phase;
use crate::observability::messages::diagnostics::ErrorRecorded;
use crate::observability::messages::StructuredLog;

/// Number of records returned by [`ErrorHandler::summary`].
pub const DEFAULT_SUMMARY_LATEST: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Where an error came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorContext {
    pub task_name: Option<String>,
    pub phase: Option<Phase>,
    pub stage: Option<String>,
    pub severity: Severity,
}

impl ErrorContext {
    pub fn for_task(task_name: impl Into<String>, phase: Phase) -> Self {
        Self {
            task_name: Some(task_name.into()),
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn for_stage(stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            ..Self::default()
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Messages of the error's `source()` chain, outermost first.
    pub trace: Vec<String>,
    pub context: ErrorContext,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub latest: Vec<ErrorRecord>,
}

/// Returned by [`ErrorHandler::handle`] when a critical error must abort the
/// caller. The record has already been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalError {
    pub record: ErrorRecord,
}

impl fmt::Display for CriticalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "critical error: {}", self.record.message)
    }
}

impl Error for CriticalError {}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ErrorHandlerOptions {
    /// Capacity of the buffer; the oldest record is evicted beyond it.
    pub max_errors: usize,
    pub log_to_console: bool,
    pub throw_on_critical: bool,
}

impl Default for ErrorHandlerOptions {
    fn default() -> Self {
        Self {
            max_errors: 100,
            log_to_console: true,
            throw_on_critical: true,
        }
    }
}

#[derive(Debug)]
pub struct ErrorHandler {
    options: ErrorHandlerOptions,
    records: Mutex<VecDeque<ErrorRecord>>,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(ErrorHandlerOptions::default())
    }
}

impl ErrorHandler {
    pub fn new(options: ErrorHandlerOptions) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(options.max_errors.min(1024))),
            options,
        }
    }

    pub fn options(&self) -> &ErrorHandlerOptions {
        &self.options
    }

    /// Record `error` and, for critical errors when configured, escalate.
    pub fn handle(
        &self,
        error: &(dyn Error + 'static),
        context: ErrorContext,
    ) -> Result<ErrorRecord, CriticalError> {
        let severity = context.severity;
        let record = ErrorRecord {
            timestamp: Utc::now(),
            message: error.to_string(),
            trace: source_chain(error),
            context,
            severity,
        };

        {
            let mut records = self.lock();
            records.push_back(record.clone());
            while records.len() > self.options.max_errors {
                records.pop_front();
            }
        }

        if self.options.log_to_console {
            ErrorRecorded {
                task_name: record.context.task_name.as_deref(),
                stage: record.context.stage.as_deref(),
                severity,
                message: &record.message,
            }
            .log();
        }

        if severity == Severity::Critical && self.options.throw_on_critical {
            return Err(CriticalError { record });
        }
        Ok(record)
    }

    /// All retained records, oldest first.
    pub fn get_errors(&self) -> Vec<ErrorRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn summary(&self) -> ErrorSummary {
        self.summary_with_latest(DEFAULT_SUMMARY_LATEST)
    }

    pub fn summary_with_latest(&self, latest: usize) -> ErrorSummary {
        let records = self.lock();
        let mut by_severity = BTreeMap::new();
        for record in records.iter() {
            *by_severity.entry(record.severity).or_insert(0) += 1;
        }
        let skip = records.len().saturating_sub(latest);
        ErrorSummary {
            total: records.len(),
            by_severity,
            latest: records.iter().skip(skip).cloned().collect(),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A listener that panicked mid-push leaves a consistent deque behind, so a
    // poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn source_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        chain.push(source.to_string());
        current = source.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaskError;

    fn quiet(max_errors: usize, throw_on_critical: bool) -> ErrorHandler {
        ErrorHandler::new(ErrorHandlerOptions {
            max_errors,
            log_to_console: false,
            throw_on_critical,
        })
    }

    fn failure(name: &str) -> TaskError {
        TaskError::Execution {
            task_name: name.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn evicts_oldest_when_capacity_exceeded() {
        let handler = quiet(2, true);
        for name in ["first", "second", "third"] {
            handler
                .handle(&failure(name), ErrorContext::for_task(name, Phase::Phase1))
                .unwrap();
        }

        let errors = handler.get_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].context.task_name.as_deref(), Some("second"));
        assert_eq!(errors[1].context.task_name.as_deref(), Some("third"));
    }

    #[test]
    fn severity_defaults_to_error() {
        let handler = quiet(10, true);
        let record = handler
            .handle(&failure("a"), ErrorContext::for_stage("validation"))
            .unwrap();
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.message, "task 'a' failed: boom");
    }

    #[test]
    fn critical_errors_escalate_only_when_configured() {
        let escalating = quiet(10, true);
        let result = escalating.handle(
            &failure("synthesis"),
            ErrorContext::for_task("synthesis", Phase::Synthesis).with_severity(Severity::Critical),
        );
        let critical = result.unwrap_err();
        assert_eq!(critical.record.severity, Severity::Critical);
        // Still recorded even though it escalated.
        assert_eq!(escalating.len(), 1);

        let lenient = quiet(10, false);
        let record = lenient
            .handle(
                &failure("synthesis"),
                ErrorContext::for_task("synthesis", Phase::Synthesis)
                    .with_severity(Severity::Critical),
            )
            .unwrap();
        assert_eq!(record.severity, Severity::Critical);
    }

    #[test]
    fn summary_counts_by_severity_and_keeps_latest() {
        let handler = quiet(100, false);
        for i in 0..7 {
            let severity = if i % 2 == 0 {
                Severity::Warning
            } else {
                Severity::Error
            };
            handler
                .handle(
                    &failure(&format!("t{i}")),
                    ErrorContext::for_stage("test").with_severity(severity),
                )
                .unwrap();
        }

        let summary = handler.summary();
        assert_eq!(summary.total, 7);
        assert_eq!(summary.by_severity[&Severity::Warning], 4);
        assert_eq!(summary.by_severity[&Severity::Error], 3);
        assert_eq!(summary.latest.len(), DEFAULT_SUMMARY_LATEST);
        assert_eq!(summary.latest[4].message, "task 't6' failed: boom");

        let two = handler.summary_with_latest(2);
        assert_eq!(two.latest.len(), 2);
        assert_eq!(two.latest[0].message, "task 't5' failed: boom");
    }

    #[test]
    fn records_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let config = crate::errors::ConfigError::Io {
            path: "profile.yaml".into(),
            source: io,
        };
        let record = quiet(10, false)
            .handle(&config, ErrorContext::for_stage("config"))
            .unwrap();
        assert_eq!(record.trace, vec!["disk gone".to_string()]);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let handler = quiet(10, false);
        handler
            .handle(&failure("a"), ErrorContext::default())
            .unwrap();
        assert!(!handler.is_empty());
        handler.clear();
        assert!(handler.is_empty());
        assert_eq!(handler.summary().total, 0);
    }
}
