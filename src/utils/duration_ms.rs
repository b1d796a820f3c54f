// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Serialize a [`Duration`] as integer milliseconds.
//!
//! ```ignore
//! #[derive(Serialize)]
//! struct Timing {
//!     #[serde(serialize_with = "crate::utils::duration_ms::serialize")]
//!     elapsed: Duration,
//! }
//! ```

use serde::Serializer;
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
