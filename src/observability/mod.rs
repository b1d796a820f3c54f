// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout The Layercake. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep structured fields and human-readable text in one place
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - Dispatcher and phase lifecycle events
//! * `messages::task` - Task registration, attempts, retries and settlement
//! * `messages::provider` - Provider cascade and backend events
//! * `messages::pipeline` - Profiling session start, completion and aborts
//! * `messages::diagnostics` - Error handler records and listener faults
//!
//! # Usage
//!
//! ```rust
//! use the_layercake::observability::messages::engine::PhaseStarted;
//! use the_layercake::observability::messages::StructuredLog;
//! use the_layercake::engine::Phase;
//!
//! let msg = PhaseStarted {
//!     phase: Phase::Phase1,
//!     task_count: 4,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
