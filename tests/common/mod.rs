// tests/common/mod.rs
//! Shared fixtures for integration tests.

#![allow(dead_code)] // Not every test crate uses every fixture.

use async_trait::async_trait;
use confluence2md::{
    build_default_registry, ConversionConfig, FetchError, MacroEngine, PageFetcher, PageId,
    ProcessingContext,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Fetcher over a fixed page set, with optional per-page delays.
pub struct FixturePageFetcher {
    pages: HashMap<String, String>,
    delays: HashMap<String, Duration>,
}

impl FixturePageFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            delays: HashMap::new(),
        }
    }

    pub fn with_page(mut self, id: &str, body: &str) -> Self {
        self.pages.insert(id.to_string(), body.to_string());
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }
}

#[async_trait]
impl PageFetcher for FixturePageFetcher {
    async fn fetch_page_body(&self, page_id: &PageId) -> Result<String, FetchError> {
        if let Some(delay) = self.delays.get(page_id.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        self.pages
            .get(page_id.as_str())
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                page_id: page_id.as_str().to_string(),
            })
    }
}

/// Engine over the stock processors and the given fixtures.
pub fn engine_with(config: ConversionConfig, fetcher: FixturePageFetcher) -> MacroEngine {
    let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);
    let registry = build_default_registry(&config, &fetcher);
    MacroEngine::new(Arc::new(registry), fetcher, config)
}

/// Root context for a page under the given config.
pub fn context_for(config: &ConversionConfig, page_id: &str) -> ProcessingContext {
    config.make_context(PageId::parse(page_id).unwrap(), None)
}

/// Storage-format include macro targeting a page.
pub fn include_macro(target: &str) -> String {
    format!(
        r#"<ac:structured-macro ac:name="include"><ac:parameter ac:name="page">{target}</ac:parameter></ac:structured-macro>"#
    )
}

/// Storage-format code macro with a language and body.
pub fn code_macro(language: &str, body: &str) -> String {
    format!(
        r#"<ac:structured-macro ac:name="code"><ac:parameter ac:name="language">{language}</ac:parameter><ac:plain-text-body><![CDATA[{body}]]></ac:plain-text-body></ac:structured-macro>"#
    )
}
