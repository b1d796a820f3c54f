// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::ProviderError;

/// A text-generation backend: one prompt in, free text out.
///
/// Backends are tried in order by a `ProviderCascade`; any error moves the
/// cascade on to the next one.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Stable name used in logs and in `CascadeResponse::provider`.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
