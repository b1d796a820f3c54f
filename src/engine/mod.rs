// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Phase-barrier task dispatch.
//!
//! ```text
//! register_task(spec) ──► Dispatcher ──► Phase1 ─┬─ task ─┐
//!                                                ├─ task ─┼─► barrier ─► merge results
//!                                                └─ task ─┘
//!                                      ──► Phase2 (sees Phase1 results) ─► barrier
//!                                      ──► Synthesis (sees everything earlier) ─► DispatchResult
//! ```

pub mod context;
pub mod dispatcher;
pub mod events;
pub mod metrics;
pub mod phase;
pub mod task;

pub use context::ExecutionContext;
pub use dispatcher::{Dispatcher, DispatcherOptions};
pub use events::EventBus;
pub use metrics::{DispatchMetrics, DispatchResult, PhaseMetrics, TaskReport};
pub use phase::{Phase, Priority};
pub use task::{
    ExecutionOutcome, RetryPolicy, Task, TaskDefinition, TaskId, TaskSpec, TaskStatus,
};
