//! Throttled request executor: jittered pacing plus an attempt-ceiling
//! retry loop above the transport.
//!
//! The transport already retries its fixed status set; this layer covers
//! everything the transport cannot resolve on its own — network timeouts,
//! connection failures, rate limits that outlived the transport budget, and
//! non-2xx answers — and guarantees the caller either gets a successful
//! body or a terminal [`ScrapeError::AttemptsExhausted`]. Never a failed
//! response dressed up as success.

use std::time::Duration;

use reqwest::Response;

use crate::error::ScrapeError;
use crate::transport::TransportClient;

/// Fixed pool of desktop browser User-Agents; each attempt picks one at
/// random so a storefront sees varied client signatures across a run.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
];

/// Picks a User-Agent from the pool.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn random_user_agent() -> &'static str {
    let index = (rand::random::<f64>() * USER_AGENTS.len() as f64) as usize;
    USER_AGENTS[index.min(USER_AGENTS.len() - 1)]
}

/// Applies ±20% jitter: `base * uniform(0.8, 1.2)`. Spreads request timing
/// so a fleet of scrapers never hits a host in lockstep.
pub(crate) fn jittered(base: Duration) -> Duration {
    base.mul_f64(rand::random::<f64>().mul_add(0.4, 0.8))
}

/// Wait before the next attempt: the server's `Retry-After` when a rate
/// limit carried one, else `2^attempt` seconds.
pub(crate) fn backoff_wait(attempt: u32, err: &ScrapeError) -> Duration {
    if let ScrapeError::RateLimited {
        retry_after_secs: Some(secs),
        ..
    } = err
    {
        return Duration::from_secs(*secs);
    }
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Runs `operation` up to `max_attempts` times with jittered pacing before
/// every attempt and exponential (or server-specified) waits between
/// failures.
///
/// Exactly `max_attempts` calls are made when every attempt fails; the
/// terminal error carries the count and the last underlying failure.
pub(crate) async fn run_attempts<T, F, Fut>(
    url: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt = 0u32;
    loop {
        if base_delay > Duration::ZERO {
            tokio::time::sleep(jittered(base_delay)).await;
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 >= max_attempts {
                    return Err(ScrapeError::AttemptsExhausted {
                        url: url.to_owned(),
                        attempts: max_attempts,
                        last_error: err.to_string(),
                    });
                }
                let wait = backoff_wait(attempt, &err);
                tracing::warn!(
                    url,
                    attempt,
                    max_attempts,
                    wait_secs = wait.as_secs(),
                    error = %err,
                    "fetch attempt failed — backing off"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Throttled executor bound to one storefront's transport client.
pub struct Throttle {
    transport: TransportClient,
    base_delay: Duration,
    max_attempts: u32,
}

impl Throttle {
    #[must_use]
    pub fn new(transport: TransportClient, base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            transport,
            base_delay,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::AttemptsExhausted`] once the attempt ceiling is hit;
    /// every transient failure before that is retried internally.
    pub async fn get(&self, url: &str) -> Result<String, ScrapeError> {
        run_attempts(url, self.max_attempts, self.base_delay, || async move {
            let response = self.transport.get(url, Some(random_user_agent())).await?;
            Self::successful_text(response, url).await
        })
        .await
    }

    /// POSTs form data to `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::get`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<String, ScrapeError> {
        run_attempts(url, self.max_attempts, self.base_delay, || async move {
            let response = self
                .transport
                .post_form(url, form, Some(random_user_agent()))
                .await?;
            Self::successful_text(response, url).await
        })
        .await
    }

    /// Accepts only 2xx responses; anything else becomes a retryable
    /// [`ScrapeError::Status`] for the attempt loop above.
    async fn successful_text(response: Response, url: &str) -> Result<String, ScrapeError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}
