// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;

use crate::engine::ExecutionContext;

/// The work a task performs.
///
/// Executors receive a per-attempt [`ExecutionContext`] and produce a JSON
/// result. Errors are opaque to the dispatcher: they are recorded with their
/// full cause chain and count against the task's retry budget. A panic is
/// treated the same as a returned error.
///
/// Executors are called once per attempt and may be called concurrently
/// from different dispatch runs, so any internal state must be `Sync`.
///
/// # Cancellation
///
/// When an attempt times out the dispatcher cancels
/// [`ExecutionContext::cancellation`] and stops waiting. Work that ignores
/// the token keeps running detached until it finishes on its own.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use the_layercake::engine::ExecutionContext;
/// use the_layercake::traits::TaskExecutor;
///
/// struct WordCount;
///
/// #[async_trait]
/// impl TaskExecutor for WordCount {
///     async fn execute(&self, ctx: ExecutionContext) -> anyhow::Result<Value> {
///         let text = ctx.initial_input()["text"].as_str().unwrap_or_default();
///         Ok(json!({ "words": text.split_whitespace().count() }))
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext) -> anyhow::Result<Value>;
}

/// Adapts an async closure into a [`TaskExecutor`].
pub struct FnExecutor<F>(F);

impl<F> FnExecutor<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> TaskExecutor for FnExecutor<F>
where
    F: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn execute(&self, ctx: ExecutionContext) -> anyhow::Result<Value> {
        (self.0)(ctx).await
    }
}
