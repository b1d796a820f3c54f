// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task definitions and the per-run attempt loop.
//!
//! A [`TaskSpec`] describes a task before registration. Registration turns it
//! into an immutable [`TaskDefinition`] owned by the dispatcher; every dispatch
//! run wraps each definition in a fresh [`Task`] holding that run's mutable
//! state (status, attempts, result, timings).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::events::{self, EventBus};
use super::{ExecutionContext, Phase, Priority, TaskReport};
use crate::errors::{Severity, TaskError};
use crate::observability::messages::task::{
    TaskAbandoned, TaskExhausted, TaskLaunched, TaskRetrying, TaskSucceeded,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{FnExecutor, TaskExecutor};
use crate::utils::panic_message;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// A fresh `task-<ulid>` identifier.
    pub fn generate() -> Self {
        TaskId(format!("task-{}", ulid::Ulid::new().to_string().to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        TaskId(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        TaskId(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Retrying,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Builder describing a task to register.
///
/// Unset timeout and retries fall back to the dispatcher's defaults.
pub struct TaskSpec {
    pub(crate) id: Option<TaskId>,
    pub(crate) name: String,
    pub(crate) phase: Phase,
    pub(crate) priority: Priority,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retries: Option<u32>,
    pub(crate) depends_on: Vec<String>,
    pub(crate) severity: Severity,
    pub(crate) executor: Arc<dyn TaskExecutor>,
}

impl TaskSpec {
    pub fn new(name: impl Into<String>, executor: impl TaskExecutor + 'static) -> Self {
        Self::with_executor(name, Arc::new(executor))
    }

    pub fn with_executor(name: impl Into<String>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            id: None,
            name: name.into(),
            phase: Phase::default(),
            priority: Priority::default(),
            timeout: None,
            retries: None,
            depends_on: Vec::new(),
            severity: Severity::default(),
            executor,
        }
    }

    /// Build a task from an async closure.
    ///
    /// ```
    /// use serde_json::json;
    /// use the_layercake::engine::{ExecutionContext, Phase, TaskSpec};
    ///
    /// let spec = TaskSpec::from_fn("echo", |ctx: ExecutionContext| async move {
    ///     Ok(json!({ "input": ctx.initial_input().clone() }))
    /// })
    /// .phase(Phase::Phase1);
    /// ```
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::new(name, FnExecutor::new(f))
    }

    pub fn id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Names of tasks in earlier phases whose results this task reads.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names.into_iter().map(Into::into));
        self
    }

    /// Severity reported to the error handler when this task fails.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Debug for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("depends_on", &self.depends_on)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// A registered task. Immutable; shared by every dispatch run.
pub struct TaskDefinition {
    id: TaskId,
    name: String,
    phase: Phase,
    priority: Priority,
    timeout: Duration,
    retries: u32,
    depends_on: Vec<String>,
    severity: Severity,
    executor: Arc<dyn TaskExecutor>,
}

impl TaskDefinition {
    pub(crate) fn from_spec(spec: TaskSpec, default_timeout: Duration, default_retries: u32) -> Self {
        Self {
            id: spec.id.unwrap_or_else(TaskId::generate),
            name: spec.name,
            phase: spec.phase,
            priority: spec.priority,
            timeout: spec.timeout.unwrap_or(default_timeout),
            retries: spec.retries.unwrap_or(default_retries),
            depends_on: spec.depends_on,
            severity: spec.severity,
            executor: spec.executor,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("depends_on", &self.depends_on)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Delay between attempts: `base_delay * multiplier^(attempt - 1)`.
///
/// A zero base delay retries immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// When false every task's retry budget is treated as zero.
    pub enabled: bool,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay: Duration::ZERO,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }

    pub fn budget(&self, retries: u32) -> u32 {
        if self.enabled {
            retries
        } else {
            0
        }
    }
}

/// Dispatcher-wide settings every attempt loop needs.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttemptSettings {
    pub retry: RetryPolicy,
    pub logging: bool,
}

/// How a task's attempt loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Completed {
        attempts: u32,
        duration: Duration,
    },
    /// Carries the last attempt's error and duration.
    Failed {
        error: TaskError,
        attempts: u32,
        duration: Duration,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ExecutionOutcome::Completed { attempts, .. }
            | ExecutionOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// One run's view of a registered task.
#[derive(Debug)]
pub struct Task {
    definition: Arc<TaskDefinition>,
    status: TaskStatus,
    attempts: u32,
    result: Option<Value>,
    error: Option<TaskError>,
    started: Option<Instant>,
    finished: Option<Instant>,
    last_attempt: Duration,
}

impl Task {
    pub(crate) fn new(definition: Arc<TaskDefinition>) -> Self {
        Self {
            definition,
            status: TaskStatus::Pending,
            attempts: 0,
            result: None,
            error: None,
            started: None,
            finished: None,
            last_attempt: Duration::ZERO,
        }
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_ref()
    }

    pub(crate) fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    pub(crate) fn report(&self) -> TaskReport {
        TaskReport {
            id: self.definition.id.clone(),
            name: self.definition.name.clone(),
            phase: self.definition.phase,
            priority: self.definition.priority,
            status: self.status,
            attempts: self.attempts,
            error: self.error.as_ref().map(ToString::to_string),
            duration: self.last_attempt,
            started: self.started,
            finished: self.finished,
        }
    }

    pub(crate) fn launch_span(&self) -> tracing::Span {
        self.launch_message(0).span("execute_task")
    }

    fn launch_message(&self, max_attempts: u32) -> TaskLaunched<'_> {
        TaskLaunched {
            task_id: &self.definition.id,
            task_name: &self.definition.name,
            phase: self.definition.phase,
            priority: self.definition.priority,
            timeout: self.definition.timeout,
            max_attempts,
        }
    }

    /// Run attempts until one succeeds or the retry budget is spent.
    ///
    /// Every attempt gets the same context. Never returns early on failure
    /// and never panics because of the executor.
    pub(crate) async fn execute(
        &mut self,
        ctx: &ExecutionContext,
        settings: &AttemptSettings,
        events: &EventBus,
    ) -> ExecutionOutcome {
        let budget = settings.retry.budget(self.definition.retries);
        if settings.logging {
            self.launch_message(budget + 1).log();
        }
        events.emit_task_start(&events::TaskStarted {
            task_id: self.definition.id.clone(),
            task_name: self.definition.name.clone(),
            phase: self.definition.phase,
            priority: self.definition.priority,
        });
        self.started = Some(Instant::now());

        loop {
            self.attempts += 1;
            self.status = TaskStatus::Running;
            let attempt_started = Instant::now();
            let outcome = self.run_attempt(ctx, settings.logging).await;
            self.last_attempt = attempt_started.elapsed();

            let error = match outcome {
                Ok(value) => return self.complete(value, settings, events),
                Err(error) => error,
            };

            if self.attempts <= budget {
                self.status = TaskStatus::Retrying;
                let delay = settings.retry.delay_for(self.attempts);
                if settings.logging {
                    TaskRetrying {
                        task_name: &self.definition.name,
                        attempt: self.attempts,
                        max_attempts: budget + 1,
                        delay,
                        error: &error,
                    }
                    .log();
                }
                events.emit_task_retry(&events::TaskRetrying {
                    task_id: self.definition.id.clone(),
                    task_name: self.definition.name.clone(),
                    phase: self.definition.phase,
                    attempt: self.attempts,
                    delay,
                    error,
                });
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            return self.fail(error, settings, events);
        }
    }

    fn complete(
        &mut self,
        value: Value,
        settings: &AttemptSettings,
        events: &EventBus,
    ) -> ExecutionOutcome {
        self.status = TaskStatus::Completed;
        self.finished = Some(Instant::now());
        if settings.logging {
            TaskSucceeded {
                task_name: &self.definition.name,
                attempts: self.attempts,
                duration: self.last_attempt,
            }
            .log();
        }
        events.emit_task_complete(&events::TaskCompleted {
            task_id: self.definition.id.clone(),
            task_name: self.definition.name.clone(),
            phase: self.definition.phase,
            attempts: self.attempts,
            duration: self.last_attempt,
            result: value.clone(),
        });
        self.result = Some(value);
        ExecutionOutcome::Completed {
            attempts: self.attempts,
            duration: self.last_attempt,
        }
    }

    fn fail(
        &mut self,
        error: TaskError,
        settings: &AttemptSettings,
        events: &EventBus,
    ) -> ExecutionOutcome {
        self.status = TaskStatus::Failed;
        self.finished = Some(Instant::now());
        if settings.logging {
            TaskExhausted {
                task_name: &self.definition.name,
                attempts: self.attempts,
                error: &error,
            }
            .log();
        }
        events.emit_task_error(&events::TaskFailed {
            task_id: self.definition.id.clone(),
            task_name: self.definition.name.clone(),
            phase: self.definition.phase,
            attempts: self.attempts,
            duration: self.last_attempt,
            error: error.clone(),
        });
        self.error = Some(error.clone());
        ExecutionOutcome::Failed {
            error,
            attempts: self.attempts,
            duration: self.last_attempt,
        }
    }

    /// One attempt: spawn the executor and race it against the timeout.
    ///
    /// On timeout the attempt's token is cancelled and the join handle
    /// dropped, which detaches the work instead of aborting it.
    async fn run_attempt(
        &self,
        ctx: &ExecutionContext,
        logging: bool,
    ) -> Result<Value, TaskError> {
        let token = ctx.cancellation().child_token();
        let attempt_ctx = ctx.with_cancellation(token.clone());
        let executor = Arc::clone(&self.definition.executor);
        let timeout = self.definition.timeout;
        let task_name = &self.definition.name;

        let mut handle = tokio::spawn(async move { executor.execute(attempt_ctx).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(error))) => Err(TaskError::Execution {
                task_name: task_name.clone(),
                message: format!("{error:#}"),
            }),
            Ok(Err(join_error)) => {
                let message = match join_error.try_into_panic() {
                    Ok(payload) => panic_message(payload.as_ref()),
                    Err(join_error) => join_error.to_string(),
                };
                Err(TaskError::Panicked {
                    task_name: task_name.clone(),
                    message,
                })
            }
            Err(_elapsed) => {
                token.cancel();
                drop(handle);
                if logging {
                    TaskAbandoned {
                        task_name,
                        attempt: self.attempts,
                        timeout,
                    }
                    .log();
                }
                Err(TaskError::TimedOut {
                    task_name: task_name.clone(),
                    timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{Flaky, Sleepy};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context() -> ExecutionContext {
        ExecutionContext::new(Arc::new(json!({})), Arc::default(), Phase::Phase1)
    }

    fn quiet() -> AttemptSettings {
        AttemptSettings {
            retry: RetryPolicy::default(),
            logging: false,
        }
    }

    fn task(spec: TaskSpec) -> Task {
        Task::new(Arc::new(TaskDefinition::from_spec(
            spec,
            Duration::from_secs(5),
            2,
        )))
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert!(a.as_str().starts_with("task-"));
        assert_ne!(a, b);
    }

    #[test]
    fn spec_defaults_resolve_at_registration() {
        let def = TaskDefinition::from_spec(
            TaskSpec::new("a", Sleepy::new(Duration::ZERO, json!(1))),
            Duration::from_secs(30),
            2,
        );
        assert_eq!(def.phase(), Phase::Phase1);
        assert_eq!(def.priority(), Priority::MEDIUM);
        assert_eq!(def.timeout(), Duration::from_secs(30));
        assert_eq!(def.retries(), 2);
        assert_eq!(def.severity(), Severity::Error);
    }

    #[test]
    fn backoff_grows_geometrically() {
        let policy = RetryPolicy {
            enabled: true,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(RetryPolicy::default().delay_for(3), Duration::ZERO);
    }

    #[test]
    fn disabled_retries_zero_the_budget() {
        let policy = RetryPolicy {
            enabled: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.budget(5), 0);
        assert_eq!(RetryPolicy::default().budget(5), 5);
    }

    #[tokio::test]
    async fn succeeds_after_prior_failures() {
        let mut task = task(TaskSpec::new("flaky", Flaky::new(2, json!("ok"))).retries(3));
        let outcome = task.execute(&context(), &quiet(), &EventBus::new()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.take_result(), Some(json!("ok")));
    }

    #[tokio::test]
    async fn exhausted_budget_records_every_attempt() {
        let mut task = task(TaskSpec::new("broken", Flaky::always_failing()).retries(2));
        let outcome = task.execute(&context(), &quiet(), &EventBus::new()).await;

        assert_eq!(outcome.attempts(), 3);
        assert_eq!(task.status(), TaskStatus::Failed);
        let error = task.error().unwrap();
        assert!(matches!(error, TaskError::Execution { .. }));
        assert!(error.to_string().contains("scripted failure"));
    }

    #[tokio::test]
    async fn timeout_fails_within_deadline_and_cancels_token() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&cancelled);
        let spec = TaskSpec::from_fn("slow", move |ctx: ExecutionContext| {
            let observed = Arc::clone(&observed);
            async move {
                tokio::select! {
                    _ = ctx.cancellation().cancelled() => {
                        observed.fetch_add(1, Ordering::SeqCst);
                        anyhow::bail!("cancelled")
                    }
                    _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(json!("late")),
                }
            }
        })
        .timeout(Duration::from_millis(50))
        .retries(0);
        let mut task = task(spec);

        let started = Instant::now();
        let outcome = task.execute(&context(), &quiet(), &EventBus::new()).await;
        let elapsed = started.elapsed();

        match outcome {
            ExecutionOutcome::Failed { error, .. } => {
                assert!(error.is_timeout());
                assert_eq!(error.to_string(), "task 'slow' timed out after 50ms");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");

        // The detached attempt observes cancellation shortly after.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn executor_panic_is_a_failed_attempt() {
        let spec = TaskSpec::from_fn("panicky", |_ctx: ExecutionContext| async move {
            if true {
                panic!("executor blew up");
            }
            Ok(json!(null))
        })
        .retries(1);
        let mut task = task(spec);

        let outcome = task.execute(&context(), &quiet(), &EventBus::new()).await;
        assert_eq!(outcome.attempts(), 2);
        match task.error() {
            Some(TaskError::Panicked { message, .. }) => assert_eq!(message, "executor blew up"),
            other => panic!("expected panic error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn emits_start_retry_and_error_events() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        {
            let log = Arc::clone(&log);
            bus.on_task_start(move |e| log.lock().unwrap().push(format!("start:{}", e.task_name)));
        }
        {
            let log = Arc::clone(&log);
            bus.on_task_retry(move |e| log.lock().unwrap().push(format!("retry:{}", e.attempt)));
        }
        {
            let log = Arc::clone(&log);
            bus.on_task_error(move |e| log.lock().unwrap().push(format!("error:{}", e.attempts)));
        }

        let mut task = task(TaskSpec::new("broken", Flaky::always_failing()).retries(1));
        task.execute(&context(), &quiet(), &bus).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:broken", "retry:1", "error:2"]
        );
    }
}
