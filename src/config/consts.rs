// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default Gemini REST endpoint (v1beta)
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
/// Environment variable holding the Gemini API key
pub const DEFAULT_GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "anthropic/claude-3-haiku";
pub const DEFAULT_OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Per-request timeout for HTTP backends, in seconds
pub const DEFAULT_BACKEND_TIMEOUT_SECONDS: u64 = 60;

/// Response cache capacity when a `cache` section omits it
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
/// Response cache entry lifetime when a `cache` section omits it (10 minutes)
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 600;
