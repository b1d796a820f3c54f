// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::{Phase, Priority, TaskId, TaskStatus};
use crate::utils::duration_ms;

/// Per-phase breakdown. Only phases that had tasks get an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseMetrics {
    /// Wall time from phase start to the last task settling.
    #[serde(rename = "duration_ms", serialize_with = "duration_ms::serialize")]
    pub duration: Duration,
    pub task_count: usize,
    pub success_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    #[serde(rename = "total_duration_ms", serialize_with = "duration_ms::serialize")]
    pub total_duration: Duration,
    pub phases: BTreeMap<Phase, PhaseMetrics>,
}

impl DispatchMetrics {
    /// `completed / total`, or 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.completed_tasks as f64 / self.total_tasks as f64
    }

    /// `total_duration / completed`, or zero when nothing completed.
    pub fn avg_task_duration(&self) -> Duration {
        match u32::try_from(self.completed_tasks) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(completed) => self.total_duration / completed,
        }
    }
}

/// Terminal state of one task after a dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub name: String,
    pub phase: Phase,
    pub priority: Priority,
    pub status: TaskStatus,
    pub attempts: u32,
    pub error: Option<String>,
    /// Duration of the last attempt.
    #[serde(rename = "duration_ms", serialize_with = "duration_ms::serialize")]
    pub duration: Duration,
    #[serde(skip)]
    pub started: Option<Instant>,
    #[serde(skip)]
    pub finished: Option<Instant>,
}

/// Aggregate outcome of one dispatch run.
///
/// `results` holds only tasks that completed; a missing name means that
/// analysis could not be produced.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub success: bool,
    pub results: BTreeMap<String, Value>,
    pub metrics: DispatchMetrics,
    pub tasks: Vec<TaskReport>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchResult {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|report| report.name == name)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks
            .iter()
            .filter(|report| report.status == TaskStatus::Failed)
    }
}
