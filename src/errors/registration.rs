// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::engine::Phase;

/// Errors that can occur while registering a task with the dispatcher
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// Task names double as result-map keys and cannot be blank
    #[error("task name must not be empty")]
    EmptyName,

    /// A task with this name is already registered
    #[error("duplicate task name: '{task_name}'")]
    DuplicateTaskName { task_name: String },

    /// A declared dependency names a task that has not been registered
    #[error("task '{task_name}' depends on '{dependency}' which is not registered")]
    UnknownDependency {
        task_name: String,
        dependency: String,
    },

    /// A declared dependency runs in the same or a later phase, so its result
    /// can never be visible to the dependent task
    #[error(
        "task '{task_name}' in {phase} depends on '{dependency}' in {dependency_phase}; dependencies must run in an earlier phase"
    )]
    DependencyNotInEarlierPhase {
        task_name: String,
        phase: Phase,
        dependency: String,
        dependency_phase: Phase,
    },
}
