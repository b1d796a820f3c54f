// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration loading and runtime assembly.
//!
//! A config file (YAML, or TOML when the extension says so) has four optional
//! sections: `dispatcher`, `error_handler`, `cascade` and `pipeline`. Anything
//! left out takes its default, so an empty file is a valid configuration.
//!
//! ```yaml
//! dispatcher:
//!   max_concurrent: 6
//!   default_retries: 1
//! cascade:
//!   backends:
//!     - type: ollama
//!       model: llama3.2
//!   cache:
//!     capacity: 128
//!     ttl_seconds: 300
//! pipeline:
//!   cultural_context: eastern
//! ```

mod loader;
mod runtime;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, BackendConfig, CacheConfig, CascadeConfig, Config,
};
pub use runtime::RuntimeBuilder;
