// src/api/mod.rs
//! Page-fetch capability: the only window onto Confluence itself.
//!
//! The engine's include machinery depends on this trait, never on HTTP
//! details. CRUD, auth flows, and space management are out of scope by
//! design; fetching one page's storage-format body is the whole
//! contract.

mod cache;
mod client;

pub use cache::CachedPageFetcher;
pub use client::ConfluenceHttpClient;

use crate::error::FetchError;
use crate::types::PageId;
use async_trait::async_trait;

/// The ability to retrieve a page's storage-format body.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page_body(&self, page_id: &PageId) -> Result<String, FetchError>;
}

/// Fetcher for offline runs: every include degrades to its fallback.
#[derive(Debug, Default)]
pub struct OfflinePageFetcher;

#[async_trait]
impl PageFetcher for OfflinePageFetcher {
    async fn fetch_page_body(&self, page_id: &PageId) -> Result<String, FetchError> {
        Err(FetchError::Network(format!(
            "no Confluence connection configured; cannot fetch page {page_id}"
        )))
    }
}
