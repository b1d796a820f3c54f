// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // model provider backends + cascade
pub mod config;     // config loading + runtime assembly
pub mod engine;     // phase dispatcher
pub mod errors;     // error types + handler
pub mod observability;
pub mod pipeline;   // profiling task graph
pub mod traits;     // task executor abstraction
pub mod utils;
