// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Successful backend output remembered for an identical prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub text: String,
    pub backend: String,
}

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// Bounded prompt → response cache with optional expiry.
///
/// Owned by whichever cascade it is injected into. Once `capacity` is reached
/// the oldest entry is evicted; entries older than `ttl` are dropped on read.
/// Reads peek, so a hit never moves an entry and eviction follows insertion
/// order.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: NonZeroUsize,
    ttl: Option<Duration>,
    entries: Mutex<LruCache<String, Entry>>,
}

impl ResponseCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity,
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub async fn get(&self, prompt: &str) -> Option<CachedResponse> {
        let mut entries = self.entries.lock().await;
        let expired = self.is_expired(entries.peek(prompt)?);
        if expired {
            entries.pop(prompt);
            return None;
        }
        entries.peek(prompt).map(|entry| entry.response.clone())
    }

    pub async fn insert(&self, prompt: &str, response: CachedResponse) {
        self.entries.lock().await.push(
            prompt.to_string(),
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl
            .map(|ttl| entry.stored_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str) -> CachedResponse {
        CachedResponse {
            text: text.to_string(),
            backend: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let cache = ResponseCache::new(2, None);
        cache.insert("a", response("1")).await;
        cache.insert("b", response("2")).await;
        cache.insert("c", response("3")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.get("c").await, Some(response("3")));
    }

    #[tokio::test]
    async fn reinsert_refreshes_position() {
        let cache = ResponseCache::new(2, None);
        cache.insert("a", response("1")).await;
        cache.insert("b", response("2")).await;
        cache.insert("a", response("1b")).await;
        cache.insert("c", response("3")).await;

        assert!(cache.get("b").await.is_none());
        assert_eq!(cache.get("a").await, Some(response("1b")));
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_read() {
        let cache = ResponseCache::new(8, Some(Duration::from_millis(20)));
        cache.insert("a", response("1")).await;
        assert!(cache.get("a").await.is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn hits_do_not_delay_eviction() {
        let cache = ResponseCache::new(2, None);
        cache.insert("a", response("1")).await;
        cache.insert("b", response("2")).await;
        assert!(cache.get("a").await.is_some());
        cache.insert("c", response("3")).await;

        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.get("b").await, Some(response("2")));
        assert_eq!(cache.capacity(), 2);
    }

    #[tokio::test]
    async fn zero_capacity_holds_one_entry() {
        let cache = ResponseCache::new(0, None);
        cache.insert("a", response("1")).await;
        cache.insert("b", response("2")).await;
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_full_prompts() {
        let cache = ResponseCache::new(8, None);
        let shared_prefix = "x".repeat(100);
        cache
            .insert(&format!("{shared_prefix}-one"), response("1"))
            .await;
        assert!(cache.get(&format!("{shared_prefix}-two")).await.is_none());
    }
}
