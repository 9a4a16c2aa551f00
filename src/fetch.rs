//! Outbound HTTP with exponential backoff retry logic.
//!
//! This module is the only place that talks to the network. Everything above
//! it works against the [`Fetch`] trait, so parsers and orchestration can be
//! exercised with canned documents.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, one GET returning a body or a byte stream
//! - [`HttpFetcher`]: `reqwest` implementation carrying the identifying
//!   `User-Agent` and explicit timeouts
//! - [`RetryFetch`]: decorator that retries transient failures on any `Fetch`
//!
//! # Retry Strategy
//!
//! - Only transport errors, HTTP 429 and HTTP 5xx are retried
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::ScraperConfig;
use crate::error::FetchError;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Response body delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

/// A GET-only client.
pub trait Fetch {
    /// Fetch `url` and return the whole body as text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Open `url` and return its body as a stream of chunks.
    ///
    /// The status is checked before the stream is returned. The default
    /// implementation delivers the whole body as a single chunk.
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        let body = self.fetch(url).await?;
        Ok(stream::once(async move { Ok(body.into_bytes()) }).boxed())
    }
}

/// `reqwest`-backed [`Fetch`] implementation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the HTTP client.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the `User-Agent` header and the request and
    ///   connect timeouts
    ///
    /// # Errors
    ///
    /// Fails when `reqwest` cannot build the client (TLS backend setup).
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        } else {
            warn!(user_agent = %config.user_agent, "User agent is not a valid header value; using client default");
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let body = self
            .send(url)
            .await?
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(body)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        let response = self.send(url).await?;
        let url = url.to_string();
        Ok(response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(move |source| FetchError::Transport {
                url: url.clone(),
                source,
            })
            .boxed())
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    /// `max_retries = 0` passes every call straight through.
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }

    /// Returns `Some(delay)` when `err` should be retried after `attempt` failures.
    fn should_retry(&self, err: &FetchError, attempt: usize, started: Instant) -> Option<Duration> {
        if !err.is_transient() {
            return None;
        }
        if attempt > self.max_retries {
            if self.max_retries > 0 {
                error!(
                    attempt,
                    max = self.max_retries,
                    elapsed_ms_total = started.elapsed().as_millis() as u64,
                    error = %err,
                    "fetch exhausted retries"
                );
            }
            return None;
        }
        let delay = self.backoff(attempt);
        warn!(
            attempt,
            max = self.max_retries,
            ?delay,
            error = %err,
            "fetch attempt failed; backing off"
        );
        Some(delay)
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

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let started = Instant::now();
        let mut attempt = 0usize;
        loop {
            match self.inner.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    match self.should_retry(&e, attempt, started) {
                        Some(delay) => sleep(delay).await,
                        None => return Err(e),
                    }
                }
            }
        }
    }

    /// Only opening the stream is retried; a failure mid-body is returned as-is.
    async fn fetch_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        let started = Instant::now();
        let mut attempt = 0usize;
        loop {
            match self.inner.fetch_stream(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    match self.should_retry(&e, attempt, started) {
                        Some(delay) => sleep(delay).await,
                        None => return Err(e),
                    }
                }
            }
        }
    }
}
