// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Typed lifecycle events published by the dispatcher.
//!
//! Listeners run synchronously, in subscription order, on whichever task
//! emitted the event. A listener that panics is logged and skipped; dispatch
//! never depends on listeners.

use serde_json::Value;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use super::{DispatchMetrics, Phase, Priority, TaskId};
use crate::errors::TaskError;
use crate::observability::messages::diagnostics::ListenerPanicked;
use crate::observability::messages::StructuredLog;
use crate::utils::panic_message;

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub task_id: TaskId,
    pub task_name: String,
    pub phase: Phase,
    pub priority: Priority,
}

#[derive(Debug, Clone)]
pub struct TaskCompleted {
    pub task_id: TaskId,
    pub task_name: String,
    pub phase: Phase,
    pub attempts: u32,
    /// Duration of the successful attempt.
    pub duration: Duration,
    pub result: Value,
}

#[derive(Debug, Clone)]
pub struct TaskFailed {
    pub task_id: TaskId,
    pub task_name: String,
    pub phase: Phase,
    pub attempts: u32,
    /// Duration of the last attempt.
    pub duration: Duration,
    pub error: TaskError,
}

/// An attempt failed and another will follow after `delay`.
#[derive(Debug, Clone)]
pub struct TaskRetrying {
    pub task_id: TaskId,
    pub task_name: String,
    pub phase: Phase,
    pub attempt: u32,
    pub delay: Duration,
    pub error: TaskError,
}

#[derive(Debug, Clone)]
pub struct PhaseStarted {
    pub phase: Phase,
    pub task_count: usize,
}

#[derive(Debug, Clone)]
pub struct PhaseCompleted {
    pub phase: Phase,
    pub task_count: usize,
    pub success_count: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct DispatchCompleted {
    pub success: bool,
    pub metrics: DispatchMetrics,
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Per-event subscriber lists.
///
/// Cloning shares the listeners, so a bus configured once can be handed to
/// any number of dispatchers.
#[derive(Clone, Default)]
pub struct EventBus {
    task_start: Vec<Listener<TaskStarted>>,
    task_complete: Vec<Listener<TaskCompleted>>,
    task_error: Vec<Listener<TaskFailed>>,
    task_retry: Vec<Listener<TaskRetrying>>,
    phase_start: Vec<Listener<PhaseStarted>>,
    phase_complete: Vec<Listener<PhaseCompleted>>,
    dispatch_complete: Vec<Listener<DispatchCompleted>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_task_start<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&TaskStarted) + Send + Sync + 'static,
    {
        self.task_start.push(Arc::new(listener));
        self
    }

    pub fn on_task_complete<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&TaskCompleted) + Send + Sync + 'static,
    {
        self.task_complete.push(Arc::new(listener));
        self
    }

    pub fn on_task_error<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&TaskFailed) + Send + Sync + 'static,
    {
        self.task_error.push(Arc::new(listener));
        self
    }

    pub fn on_task_retry<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&TaskRetrying) + Send + Sync + 'static,
    {
        self.task_retry.push(Arc::new(listener));
        self
    }

    pub fn on_phase_start<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&PhaseStarted) + Send + Sync + 'static,
    {
        self.phase_start.push(Arc::new(listener));
        self
    }

    pub fn on_phase_complete<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&PhaseCompleted) + Send + Sync + 'static,
    {
        self.phase_complete.push(Arc::new(listener));
        self
    }

    pub fn on_dispatch_complete<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&DispatchCompleted) + Send + Sync + 'static,
    {
        self.dispatch_complete.push(Arc::new(listener));
        self
    }

    pub fn listener_count(&self) -> usize {
        self.task_start.len()
            + self.task_complete.len()
            + self.task_error.len()
            + self.task_retry.len()
            + self.phase_start.len()
            + self.phase_complete.len()
            + self.dispatch_complete.len()
    }

    pub(crate) fn emit_task_start(&self, event: &TaskStarted) {
        emit("task:start", &self.task_start, event);
    }

    pub(crate) fn emit_task_complete(&self, event: &TaskCompleted) {
        emit("task:complete", &self.task_complete, event);
    }

    pub(crate) fn emit_task_error(&self, event: &TaskFailed) {
        emit("task:error", &self.task_error, event);
    }

    pub(crate) fn emit_task_retry(&self, event: &TaskRetrying) {
        emit("task:retry", &self.task_retry, event);
    }

    pub(crate) fn emit_phase_start(&self, event: &PhaseStarted) {
        emit("phase:start", &self.phase_start, event);
    }

    pub(crate) fn emit_phase_complete(&self, event: &PhaseCompleted) {
        emit("phase:complete", &self.phase_complete, event);
    }

    pub(crate) fn emit_dispatch_complete(&self, event: &DispatchCompleted) {
        emit("dispatch:complete", &self.dispatch_complete, event);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

fn emit<E>(event: &str, listeners: &[Listener<E>], payload: &E) {
    for listener in listeners {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(payload))) {
            ListenerPanicked {
                event,
                message: &panic_message(panic.as_ref()),
            }
            .log();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn listeners_run_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for id in 0..3 {
            let seen = Arc::clone(&seen);
            bus.on_phase_start(move |event: &PhaseStarted| {
                seen.lock().unwrap().push((id, event.phase));
            });
        }

        bus.emit_phase_start(&PhaseStarted {
            phase: Phase::Phase2,
            task_count: 1,
        });

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, Phase::Phase2), (1, Phase::Phase2), (2, Phase::Phase2)]
        );
    }

    #[test]
    fn panicking_listener_does_not_stop_the_rest() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        bus.on_phase_complete(|_| panic!("listener exploded"));
        let counter = Arc::clone(&calls);
        bus.on_phase_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit_phase_complete(&PhaseCompleted {
            phase: Phase::Phase1,
            task_count: 0,
            success_count: 0,
            duration: Duration::ZERO,
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_listeners() {
        let mut bus = EventBus::new();
        bus.on_task_start(|_| {}).on_task_error(|_| {});
        let copy = bus.clone();
        assert_eq!(copy.listener_count(), 2);
    }
}
