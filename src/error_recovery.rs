// src/error_recovery.rs
//! Retry with exponential backoff for page-fetch operations.

use crate::error::FetchError;
use rand::Rng;
use std::time::Duration;

/// Retries an async fetch operation with exponential backoff and jitter.
///
/// Non-retryable errors (not-found, permission) are returned immediately;
/// only transient network failures consume attempts.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => {
                last_error = Some(e);

                if attempt < max_attempts {
                    let jitter = rand::rng().random_range(0..=delay.as_millis() as u64 / 4);
                    let wait = delay + Duration::from_millis(jitter);
                    log::warn!("Fetch attempt {} failed, retrying after {:?}", attempt, wait);
                    tokio::time::sleep(wait).await;

                    // Exponential backoff with cap
                    delay = std::cmp::min(delay * 2, max_delay);
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| FetchError::Network("retry failed with no recorded error".to_string())))
}
