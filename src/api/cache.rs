// src/api/cache.rs
//! TTL-bounded read cache over a page fetcher.
//!
//! A document that includes the same page several times should hit the
//! network once. Entries expire after a TTL so long-running export
//! sessions do not serve stale bodies. Only successful fetches are
//! cached; failures always retry the underlying fetcher.

use super::PageFetcher;
use crate::constants::{PAGE_CACHE_CAPACITY, PAGE_CACHE_TTL};
use crate::error::FetchError;
use crate::types::PageId;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CachedBody {
    body: String,
    fetched_at: Instant,
}

/// LRU + TTL cache wrapper around any [`PageFetcher`].
pub struct CachedPageFetcher {
    inner: Arc<dyn PageFetcher>,
    entries: Mutex<LruCache<String, CachedBody>>,
    ttl: Duration,
}

impl CachedPageFetcher {
    pub fn new(inner: Arc<dyn PageFetcher>) -> Self {
        Self::with_limits(inner, PAGE_CACHE_CAPACITY, PAGE_CACHE_TTL)
    }

    pub fn with_limits(inner: Arc<dyn PageFetcher>, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    fn cached_body(&self, page_id: &PageId) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(page_id.as_str()) {
            Some(entry) if entry.fetched_at.elapsed() <= self.ttl => Some(entry.body.clone()),
            Some(_) => {
                entries.pop(page_id.as_str());
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl PageFetcher for CachedPageFetcher {
    async fn fetch_page_body(&self, page_id: &PageId) -> Result<String, FetchError> {
        if let Some(body) = self.cached_body(page_id) {
            log::debug!("Page {page_id} served from cache");
            return Ok(body);
        }

        let body = self.inner.fetch_page_body(page_id).await?;
        self.entries.lock().put(
            page_id.as_str().to_string(),
            CachedBody {
                body: body.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(body)
    }
}
