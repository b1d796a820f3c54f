// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use super::ProviderBackend;
use crate::errors::ProviderError;

/// Returns the same configured text for every prompt. For offline runs.
#[derive(Debug, Clone)]
pub struct FixedBackend {
    name: String,
    response: String,
}

impl FixedBackend {
    pub fn new(name: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: response.into(),
        }
    }
}

#[async_trait]
impl ProviderBackend for FixedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ignores_prompt() {
        let backend = FixedBackend::new("offline", "{\"a\": 1}");
        assert_eq!(backend.name(), "offline");
        assert_eq!(backend.generate("anything").await.unwrap(), "{\"a\": 1}");
    }
}
