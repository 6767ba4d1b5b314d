//! HTTP page fetching with exponential backoff retry logic.
//!
//! Scrapers never talk to `reqwest` directly; they are generic over
//! [`PageFetcher`] so the network can be swapped out in tests.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: Core trait, fetch a URL and return its body as text
//! - [`HttpFetcher`]: `reqwest`-backed implementation sharing one client
//! - [`RetryFetch`]: Decorator that adds retry logic to any `PageFetcher`
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::SourcesConfig;
use rand::{Rng, rng};
use reqwest::Client;
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Trait for async page retrieval.
pub trait PageFetcher {
    /// Fetch `url` and return the response body as text.
    ///
    /// Non-success HTTP statuses are errors.
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the configured user agent and optional timeout.
    pub fn new(config: &SourcesConfig) -> Result<Self, Box<dyn Error>> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched page"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageFetcher`].
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Create a new retry wrapper around an existing [`PageFetcher`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetcher::new(&config)?;
    /// let fetcher = RetryFetch::new(http, 2, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self
            .base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: Cell::new(failures),
                calls: Cell::new(0),
            }
        }
    }

    impl PageFetcher for Flaky {
        async fn fetch_text(&self, _url: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("connection reset".into());
            }
            Ok("body".to_string())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let fetcher = RetryFetch::new(Flaky::new(2), 3, StdDuration::from_millis(10));
        let body = fetcher.fetch_text("https://example.com").await.unwrap();

        assert_eq!(body, "body");
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let fetcher = RetryFetch::new(Flaky::new(10), 2, StdDuration::from_millis(10));
        let result = fetcher.fetch_text("https://example.com").await;

        assert!(result.is_err());
        assert_eq!(fetcher.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_fails_fast() {
        let fetcher = RetryFetch::new(Flaky::new(1), 0, StdDuration::from_secs(60));
        assert!(fetcher.fetch_text("https://example.com").await.is_err());
        assert_eq!(fetcher.inner.calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let fetcher = RetryFetch::new(Flaky::new(0), 50, StdDuration::from_secs(1));
        assert!(fetcher.backoff(1) < StdDuration::from_millis(1251));
        assert!(fetcher.backoff(40) <= StdDuration::from_millis(30_250));
    }

    #[test]
    fn test_http_fetcher_builds_from_config() {
        let config = SourcesConfig {
            request_timeout_secs: Some(5),
            ..SourcesConfig::default()
        };
        assert!(HttpFetcher::new(&config).is_ok());
    }
}
