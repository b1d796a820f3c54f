// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::Phase;

/// Read-only snapshot handed to every task of a phase.
///
/// Built once per phase from the initial input plus the results of every
/// task that completed in an earlier phase. Cloning is cheap; all clones of a
/// phase's context share the same maps.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    initial_input: Arc<Value>,
    previous_results: Arc<BTreeMap<String, Value>>,
    phase: Phase,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(
        initial_input: Arc<Value>,
        previous_results: Arc<BTreeMap<String, Value>>,
        phase: Phase,
    ) -> Self {
        Self {
            initial_input,
            previous_results,
            phase,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn initial_input(&self) -> &Value {
        &self.initial_input
    }

    /// Deserialize the initial input into a typed value.
    pub fn input_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.initial_input.as_ref())
    }

    /// Results of all earlier phases, keyed by task name in sorted order.
    pub fn previous_results(&self) -> &BTreeMap<String, Value> {
        &self.previous_results
    }

    pub fn previous_result(&self, task_name: &str) -> Option<&Value> {
        self.previous_results.get(task_name)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Cancelled when the attempt this context was handed to times out.
    ///
    /// Executors doing long-running work should select on it and release
    /// whatever they hold; an executor that ignores it keeps running detached
    /// after its result has been discarded.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn with_cancellation(&self, cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Input {
        text: String,
    }

    #[test]
    fn exposes_input_and_previous_results() {
        let mut previous = BTreeMap::new();
        previous.insert("b".to_string(), json!(2));
        previous.insert("a".to_string(), json!(1));
        let ctx = ExecutionContext::new(
            Arc::new(json!({"text": "hello"})),
            Arc::new(previous),
            Phase::Phase2,
        );

        let input: Input = ctx.input_as().unwrap();
        assert_eq!(input.text, "hello");
        assert_eq!(ctx.previous_result("a"), Some(&json!(1)));
        assert_eq!(ctx.previous_result("missing"), None);
        let keys: Vec<_> = ctx.previous_results().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(ctx.phase(), Phase::Phase2);
    }

    #[test]
    fn child_contexts_carry_their_own_token() {
        let ctx = ExecutionContext::new(Arc::new(Value::Null), Arc::default(), Phase::Phase1);
        let token = ctx.cancellation().child_token();
        let attempt = ctx.with_cancellation(token.clone());

        token.cancel();
        assert!(attempt.is_cancelled());
        assert!(!ctx.is_cancelled());
    }
}
