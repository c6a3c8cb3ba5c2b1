//! Transport client: one pooled HTTP session per storefront with
//! status-aware retries.
//!
//! The transport retries only the statuses in [`RETRYABLE_STATUSES`] and
//! hands every other response back untouched — a 404 is an answer, not a
//! failure, and the throttled executor above decides what to do with it.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use crate::error::ScrapeError;

/// Status codes worth retrying at the transport level: rate limiting plus
/// the transient server-side 5xx family.
pub const RETRYABLE_STATUSES: [u16; 9] = [429, 500, 502, 503, 504, 509, 510, 511, 512];

/// Idle connections kept per host. Moderate parallelism only; within one
/// storefront fetches are sequential anyway.
const POOL_MAX_IDLE_PER_HOST: usize = 5;

/// Transport construction knobs. `Default` mirrors the process-wide config
/// defaults.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Retry budget for statuses in [`RETRYABLE_STATUSES`].
    pub retries: u32,
    /// Backoff between transport retries: `backoff_factor * 2^retry_index`
    /// seconds, unless `Retry-After` says otherwise.
    pub backoff_factor: f64,
    /// Many of the targeted storefronts present broken certificate chains.
    /// Accepting them is a deliberate trade-off, overridable per deployment.
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 20,
            request_timeout_secs: 40,
            retries: 5,
            backoff_factor: 0.8,
            accept_invalid_certs: true,
        }
    }
}

/// Pooled HTTP client owned by one storefront scraper for its whole run.
pub struct TransportClient {
    client: Client,
    retries: u32,
    backoff_factor: f64,
}

impl TransportClient {
    /// Builds the underlying `reqwest::Client` with connection pooling and
    /// the configured timeout pair.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the client cannot be constructed
    /// (e.g., invalid TLS config).
    pub fn new(config: &TransportConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            retries: config.retries,
            backoff_factor: config.backoff_factor,
        })
    }

    /// Issues a GET request with transport-level retry.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Http`] — network or TLS failure (not retried here;
    ///   the throttled executor owns that retry path).
    /// - [`ScrapeError::RateLimited`] — still 429 after the retry budget.
    /// - [`ScrapeError::RetryBudgetExhausted`] — still 5xx after the budget.
    pub async fn get(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<Response, ScrapeError> {
        self.execute(url, || {
            let mut request = self.client.get(url);
            if let Some(ua) = user_agent {
                request = request.header(reqwest::header::USER_AGENT, ua);
            }
            request
        })
        .await
    }

    /// Issues a form-encoded POST request with transport-level retry. Some
    /// storefronts page their listings through POSTed form data.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        user_agent: Option<&str>,
    ) -> Result<Response, ScrapeError> {
        self.execute(url, || {
            let mut request = self.client.post(url).form(form);
            if let Some(ua) = user_agent {
                request = request.header(reqwest::header::USER_AGENT, ua);
            }
            request
        })
        .await
    }

    /// Retry loop over one request shape. Non-retryable statuses are
    /// returned as responses on the spot; retryable ones burn the budget
    /// with `backoff_factor * 2^i` waits, honoring `Retry-After` when the
    /// server sends one.
    async fn execute<F>(&self, url: &str, build: F) -> Result<Response, ScrapeError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retry_index = 0u32;
        loop {
            let response = build().send().await?;
            let status = response.status().as_u16();

            if !RETRYABLE_STATUSES.contains(&status) {
                return Ok(response);
            }

            let retry_after_secs = retry_after(&response);

            if retry_index >= self.retries {
                if status == 429 {
                    return Err(ScrapeError::RateLimited {
                        domain: domain_of(url),
                        retry_after_secs,
                    });
                }
                return Err(ScrapeError::RetryBudgetExhausted {
                    url: url.to_owned(),
                    status,
                    retries: self.retries,
                });
            }

            let wait = retry_after_secs.map_or_else(
                || backoff_delay(self.backoff_factor, retry_index),
                Duration::from_secs,
            );
            tracing::warn!(
                url,
                status,
                retry_index,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "retryable status from transport — backing off"
            );
            tokio::time::sleep(wait).await;
            retry_index += 1;
        }
    }
}

/// Exponential transport backoff: `factor * 2^retry_index` seconds.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn backoff_delay(factor: f64, retry_index: u32) -> Duration {
    // Shift capped well below overflow; by then the wait is hours anyway.
    let doubling = (1u64 << retry_index.min(20)) as f64;
    Duration::from_secs_f64(factor * doubling)
}

/// Parses a numeric `Retry-After` header, ignoring the HTTP-date form.
fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn domain_of(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(url)
        .to_owned()
}
