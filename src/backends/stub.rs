// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripted executors and provider backends for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::backends::ProviderBackend;
use crate::engine::ExecutionContext;
use crate::errors::ProviderError;
use crate::traits::TaskExecutor;

/// Sleeps for a fixed delay, then returns a fixed value.
pub struct Sleepy {
    delay: Duration,
    value: Value,
}

impl Sleepy {
    pub fn new(delay: Duration, value: Value) -> Self {
        Self { delay, value }
    }
}

#[async_trait]
impl TaskExecutor for Sleepy {
    async fn execute(&self, _ctx: ExecutionContext) -> anyhow::Result<Value> {
        tokio::time::sleep(self.delay).await;
        Ok(self.value.clone())
    }
}

/// Fails a fixed number of times, then succeeds.
pub struct Flaky {
    failures: usize,
    value: Value,
    calls: AtomicUsize,
}

impl Flaky {
    pub fn new(failures: usize, value: Value) -> Self {
        Self {
            failures,
            value,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(usize::MAX, Value::Null)
    }
}

#[async_trait]
impl TaskExecutor for Flaky {
    async fn execute(&self, _ctx: ExecutionContext) -> anyhow::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            anyhow::bail!("scripted failure on call {}", call + 1);
        }
        Ok(self.value.clone())
    }
}

/// Provider backend that returns the same response on every call.
pub struct StaticBackend {
    name: String,
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl StaticBackend {
    pub fn ok(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: Err("scripted outage".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(|reason| ProviderError::unavailable(&self.name, reason))
    }
}
