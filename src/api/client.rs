// src/api/client.rs
//! Thin HTTP client for the Confluence REST API.
//!
//! Handles authentication and the one request the engine needs, namely the
//! storage-format body of a page, with retry for transient failures.
//! No parsing or business logic beyond unwrapping the response envelope.

use super::PageFetcher;
use crate::constants::{FETCH_RETRY_ATTEMPTS, FETCH_RETRY_INITIAL_DELAY, FETCH_RETRY_MAX_DELAY};
use crate::error::{ConversionError, FetchError};
use crate::error_recovery::retry_with_backoff;
use crate::types::PageId;
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use url::Url;

/// Response envelope for `GET /rest/api/content/{id}?expand=body.storage`.
#[derive(Debug, Deserialize)]
struct ContentResponse {
    body: ContentBody,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    storage: StorageRepresentation,
}

#[derive(Debug, Deserialize)]
struct StorageRepresentation {
    value: String,
}

/// A thin wrapper around reqwest for Confluence page reads.
#[derive(Clone)]
pub struct ConfluenceHttpClient {
    client: Client,
    base_url: Url,
}

impl ConfluenceHttpClient {
    /// Creates a client for the given Confluence base URL.
    pub fn new(base_url: &str, api_token: &str) -> Result<Self, ConversionError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConversionError::InvalidConfiguration(format!("invalid base URL: {e}"))
        })?;

        let client = Client::builder()
            .default_headers(Self::create_headers(api_token)?)
            .build()
            .map_err(|e| ConversionError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn create_headers(api_token: &str) -> Result<header::HeaderMap, ConversionError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {api_token}");
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                ConversionError::MissingConfiguration(format!("invalid API token format: {e}"))
            })?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn content_url(&self, page_id: &PageId) -> Result<Url, FetchError> {
        self.base_url
            .join(&format!("rest/api/content/{page_id}?expand=body.storage"))
            .map_err(|e| FetchError::MalformedResponse(format!("cannot build content URL: {e}")))
    }

    async fn fetch_once(&self, page_id: &PageId) -> Result<String, FetchError> {
        let url = self.content_url(page_id)?;
        log::debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    page_id: page_id.as_str().to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::PermissionDenied {
                    page_id: page_id.as_str().to_string(),
                    reason: format!("HTTP {}", response.status()),
                })
            }
            status => {
                return Err(FetchError::Network(format!(
                    "unexpected HTTP status {status} for page {page_id}"
                )))
            }
        }

        let parsed: ContentResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
        Ok(parsed.body.storage.value)
    }
}

#[async_trait]
impl PageFetcher for ConfluenceHttpClient {
    async fn fetch_page_body(&self, page_id: &PageId) -> Result<String, FetchError> {
        retry_with_backoff(
            || self.fetch_once(page_id),
            FETCH_RETRY_ATTEMPTS,
            FETCH_RETRY_INITIAL_DELAY,
            FETCH_RETRY_MAX_DELAY,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_base_urls() {
        assert!(ConfluenceHttpClient::new("not a url", "token").is_err());
    }

    #[test]
    fn builds_content_urls_under_the_base() {
        let client = ConfluenceHttpClient::new("https://wiki.example.com/", "token").unwrap();
        let url = client.content_url(&PageId::parse("12345").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://wiki.example.com/rest/api/content/12345?expand=body.storage"
        );
    }
}
