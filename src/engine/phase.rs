// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// A barrier-separated stage of a dispatch run.
///
/// Phases run strictly in [`Phase::ALL`] order; every task of one phase
/// settles before any task of the next begins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Phase {
    /// Independent analyses that read only the initial input
    #[default]
    #[serde(rename = "phase_1")]
    Phase1,
    /// Analyses that may read Phase1 results
    #[serde(rename = "phase_2")]
    Phase2,
    /// Final merge and correlation
    #[serde(rename = "synthesis")]
    Synthesis,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Phase1, Phase::Phase2, Phase::Synthesis];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Phase1 => "phase_1",
            Phase::Phase2 => "phase_2",
            Phase::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering hint within a phase. Lower values launch first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(1);
    pub const HIGH: Priority = Priority(2);
    pub const MEDIUM: Priority = Priority(3);
    pub const LOW: Priority = Priority(4);

    pub const fn new(value: i32) -> Self {
        Priority(value)
    }

    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::MEDIUM
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
