// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit that line together with typed fields at the
//! message's log level.
//!
//! # Organization
//!
//! * `engine` - Dispatcher and phase lifecycle events
//! * `task` - Task registration, attempts and settlement
//! * `provider` - Provider cascade and backend events
//! * `pipeline` - Profiling run lifecycle
//! * `diagnostics` - Error handler and listener events
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_layercake::observability::messages::engine::DispatchStarted;
//!
//! let msg = DispatchStarted {
//!     task_count: 12,
//!     phase_count: 3,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod diagnostics;
pub mod engine;
pub mod pipeline;
pub mod provider;
pub mod task;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
