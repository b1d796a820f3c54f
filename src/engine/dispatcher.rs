// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::Instrument;

use super::events::{self, EventBus};
use super::task::{AttemptSettings, RetryPolicy, Task, TaskDefinition, TaskSpec};
use super::{
    DispatchMetrics, DispatchResult, ExecutionContext, Phase, PhaseMetrics, TaskId, TaskStatus,
};
use crate::errors::{
    CriticalError, DispatchError, ErrorContext, ErrorHandler, RegistrationError,
};
use crate::observability::messages::engine::{
    DispatchAborted, DispatchCompleted, DispatchStarted, PhaseCompleted, PhaseSkipped,
    PhaseStarted,
};
use crate::observability::messages::task::TaskRegistered;
use crate::observability::messages::StructuredLog;

/// Dispatcher-wide settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatcherOptions {
    /// Hard cap on tasks running at once. `None` launches every task of a
    /// phase together.
    pub max_concurrent: Option<usize>,
    pub default_timeout_ms: u64,
    pub default_retries: u32,
    pub enable_metrics: bool,
    pub enable_logging: bool,
    pub retry_failed_tasks: bool,
    pub retry_base_delay_ms: u64,
    pub retry_multiplier: f64,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            default_timeout_ms: 30_000,
            default_retries: 2,
            enable_metrics: true,
            enable_logging: true,
            retry_failed_tasks: true,
            retry_base_delay_ms: 0,
            retry_multiplier: 2.0,
        }
    }
}

impl DispatcherOptions {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.retry_failed_tasks,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            multiplier: self.retry_multiplier,
        }
    }
}

/// Phase-barrier task dispatcher.
///
/// Tasks are registered once and may be dispatched any number of times. Each
/// run walks [`Phase::ALL`] in order, launches every task of the current
/// phase concurrently, and waits for all of them to settle before merging
/// their results and moving on. A task failure never cancels its siblings;
/// the only early exit is a critical failure escalated by the attached
/// [`ErrorHandler`].
///
/// ```
/// use serde_json::json;
/// use the_layercake::engine::{Dispatcher, DispatcherOptions, ExecutionContext, Phase, TaskSpec};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut dispatcher = Dispatcher::new(DispatcherOptions::default());
/// dispatcher.register_task(TaskSpec::from_fn("greet", |_ctx: ExecutionContext| async {
///     Ok(json!("hello"))
/// }))?;
/// dispatcher.register_task(
///     TaskSpec::from_fn("shout", |ctx: ExecutionContext| async move {
///         let greeting = ctx.previous_result("greet").and_then(|v| v.as_str()).unwrap_or("");
///         Ok(json!(greeting.to_uppercase()))
///     })
///     .phase(Phase::Phase2)
///     .depends_on(["greet"]),
/// )?;
///
/// let result = dispatcher.dispatch(json!({})).await?;
/// assert!(result.success);
/// assert_eq!(result.results["shout"], json!("HELLO"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dispatcher {
    options: DispatcherOptions,
    tasks: Vec<Arc<TaskDefinition>>,
    events: EventBus,
    error_handler: Option<Arc<ErrorHandler>>,
}

impl Dispatcher {
    pub fn new(options: DispatcherOptions) -> Self {
        Self {
            options,
            tasks: Vec::new(),
            events: EventBus::new(),
            error_handler: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Report terminal task failures to `handler`; a critical failure it
    /// escalates aborts the run.
    pub fn with_error_handler(mut self, handler: Arc<ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn options(&self) -> &DispatcherOptions {
        &self.options
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter().map(AsRef::as_ref)
    }

    /// Validate and register a task.
    ///
    /// Names must be unique and non-empty. Every declared dependency must
    /// already be registered in a strictly earlier phase, since results from
    /// the same or a later phase are never visible.
    pub fn register_task(&mut self, spec: TaskSpec) -> Result<TaskId, RegistrationError> {
        if spec.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.find(&spec.name).is_some() {
            return Err(RegistrationError::DuplicateTaskName {
                task_name: spec.name,
            });
        }
        for dependency in &spec.depends_on {
            let Some(registered) = self.find(dependency) else {
                return Err(RegistrationError::UnknownDependency {
                    task_name: spec.name.clone(),
                    dependency: dependency.clone(),
                });
            };
            if registered.phase() >= spec.phase {
                return Err(RegistrationError::DependencyNotInEarlierPhase {
                    task_name: spec.name.clone(),
                    phase: spec.phase,
                    dependency: dependency.clone(),
                    dependency_phase: registered.phase(),
                });
            }
        }

        let definition = TaskDefinition::from_spec(
            spec,
            self.options.default_timeout(),
            self.options.default_retries,
        );
        if self.options.enable_logging {
            TaskRegistered {
                task_id: definition.id(),
                task_name: definition.name(),
                phase: definition.phase(),
                priority: definition.priority(),
            }
            .log();
        }
        let id = definition.id().clone();
        self.tasks.push(Arc::new(definition));
        Ok(id)
    }

    /// Register specs in order, returning their ids.
    ///
    /// Stops at the first spec that fails validation. Specs before it stay
    /// registered; the failing spec and everything after it are not.
    pub fn register_tasks<I>(&mut self, specs: I) -> Result<Vec<TaskId>, RegistrationError>
    where
        I: IntoIterator<Item = TaskSpec>,
    {
        specs
            .into_iter()
            .map(|spec| self.register_task(spec))
            .collect()
    }

    fn find(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks()
            .find(|definition| definition.name() == name)
    }

    /// Run every registered task, phase by phase.
    ///
    /// Returns a result even when tasks fail; `success` is false whenever any
    /// task ended failed. Errors are limited to critical escalation and the
    /// dispatcher's own bookkeeping.
    pub async fn dispatch(&self, initial_input: Value) -> Result<DispatchResult, DispatchError> {
        let logging = self.options.enable_logging;
        let started = Instant::now();
        let input = Arc::new(initial_input);
        let events = Arc::new(self.events.clone());
        let settings = Arc::new(AttemptSettings {
            retry: self.options.retry_policy(),
            logging,
        });
        let semaphore = self
            .options
            .max_concurrent
            .map(|permits| Arc::new(Semaphore::new(permits.max(1))));

        let mut results: BTreeMap<String, Value> = BTreeMap::new();
        let mut metrics = DispatchMetrics {
            total_tasks: self.tasks.len(),
            ..DispatchMetrics::default()
        };
        let mut reports = Vec::with_capacity(self.tasks.len());

        let buckets = self.partition();
        if logging {
            DispatchStarted {
                task_count: self.tasks.len(),
                phase_count: buckets.len(),
            }
            .log();
        }

        for phase in Phase::ALL {
            let Some(bucket) = buckets.get(&phase) else {
                if logging {
                    PhaseSkipped { phase }.log();
                }
                continue;
            };
            let task_count = bucket.len();

            // Snapshot of everything that completed in earlier phases.
            let ctx = ExecutionContext::new(Arc::clone(&input), Arc::new(results.clone()), phase);

            if logging {
                PhaseStarted { phase, task_count }.log();
            }
            events.emit_phase_start(&events::PhaseStarted { phase, task_count });

            let phase_started = Instant::now();
            let settled = Self::run_phase(bucket, &ctx, &events, &settings, semaphore.as_ref())
                .instrument(PhaseStarted { phase, task_count }.span("run_phase"))
                .await?;
            let duration = phase_started.elapsed();

            let mut success_count = 0;
            let mut critical: Option<CriticalError> = None;
            for mut task in settled {
                reports.push(task.report());
                match task.status() {
                    TaskStatus::Completed => {
                        success_count += 1;
                        if let Some(value) = task.take_result() {
                            results.insert(task.name().to_string(), value);
                        }
                    }
                    _ => {
                        if let Err(escalated) = self.report_failure(&task) {
                            critical.get_or_insert(escalated);
                        }
                    }
                }
            }
            metrics.completed_tasks += success_count;
            metrics.failed_tasks += task_count - success_count;

            if self.options.enable_metrics {
                metrics.phases.insert(
                    phase,
                    PhaseMetrics {
                        duration,
                        task_count,
                        success_count,
                    },
                );
            }
            if logging {
                PhaseCompleted {
                    phase,
                    task_count,
                    success_count,
                    duration,
                }
                .log();
            }
            events.emit_phase_complete(&events::PhaseCompleted {
                phase,
                task_count,
                success_count,
                duration,
            });

            if let Some(escalated) = critical {
                let error = DispatchError::Critical {
                    task_name: escalated.record.context.task_name.clone().unwrap_or_default(),
                    phase,
                    message: escalated.record.message,
                };
                if logging {
                    DispatchAborted {
                        phase,
                        error: &error,
                    }
                    .log();
                }
                return Err(error);
            }
        }

        metrics.total_duration = started.elapsed();
        let success = metrics.failed_tasks == 0;
        if logging {
            DispatchCompleted {
                success,
                total_tasks: metrics.total_tasks,
                completed_tasks: metrics.completed_tasks,
                failed_tasks: metrics.failed_tasks,
                success_rate: metrics.success_rate(),
                duration: metrics.total_duration,
            }
            .log();
        }
        events.emit_dispatch_complete(&events::DispatchCompleted {
            success,
            metrics: metrics.clone(),
        });

        Ok(DispatchResult {
            success,
            results,
            metrics,
            tasks: reports,
            timestamp: Utc::now(),
        })
    }

    /// Group definitions by phase, each bucket in ascending priority with
    /// registration order breaking ties. Empty phases have no bucket.
    fn partition(&self) -> HashMap<Phase, Vec<Arc<TaskDefinition>>> {
        let mut buckets: HashMap<Phase, Vec<Arc<TaskDefinition>>> = HashMap::new();
        for definition in &self.tasks {
            buckets
                .entry(definition.phase())
                .or_default()
                .push(Arc::clone(definition));
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by_key(|definition| definition.priority());
        }
        buckets
    }

    /// Launch every task of a phase and wait for all of them to settle.
    async fn run_phase(
        bucket: &[Arc<TaskDefinition>],
        ctx: &ExecutionContext,
        events: &Arc<EventBus>,
        settings: &Arc<AttemptSettings>,
        semaphore: Option<&Arc<Semaphore>>,
    ) -> Result<Vec<Task>, DispatchError> {
        let mut handles = Vec::with_capacity(bucket.len());

        for definition in bucket {
            let mut task = Task::new(Arc::clone(definition));
            let span = task.launch_span();
            let ctx = ctx.clone();
            let events = Arc::clone(events);
            let settings = Arc::clone(settings);
            let semaphore = semaphore.cloned();

            let handle = tokio::spawn(
                async move {
                    let _permit = match semaphore {
                        Some(semaphore) => Some(semaphore.acquire_owned().await.map_err(|e| {
                            DispatchError::Internal {
                                message: format!(
                                    "failed to acquire concurrency permit for task '{}': {}",
                                    task.name(),
                                    e
                                ),
                            }
                        })?),
                        None => None,
                    };
                    task.execute(&ctx, &settings, &events).await;
                    Ok::<Task, DispatchError>(task)
                }
                .instrument(span),
            );
            handles.push(handle);
        }

        let mut settled = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Ok(task)) => settled.push(task),
                Ok(Err(error)) => return Err(error),
                Err(join_error) => {
                    return Err(DispatchError::Internal {
                        message: format!("task join error: {}", join_error),
                    });
                }
            }
        }
        Ok(settled)
    }

    fn report_failure(&self, task: &Task) -> Result<(), CriticalError> {
        let (Some(handler), Some(error)) = (&self.error_handler, task.error()) else {
            return Ok(());
        };
        let definition = task.definition();
        handler
            .handle(
                error,
                ErrorContext::for_task(definition.name(), definition.phase())
                    .with_severity(definition.severity()),
            )
            .map(|_| ())
    }
}
