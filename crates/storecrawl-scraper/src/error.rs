use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs:?}s)")]
    RateLimited {
        domain: String,
        /// Server-provided `Retry-After` seconds, when the header was present
        /// and numeric.
        retry_after_secs: Option<u64>,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("retry budget exhausted for {url}: still {status} after {retries} transport retries")]
    RetryBudgetExhausted {
        url: String,
        status: u16,
        retries: u32,
    },

    #[error("fetch failed for {url} after {attempts} attempts: {last_error}")]
    AttemptsExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
