use std::path::PathBuf;

/// Runtime configuration shared by every storefront run.
///
/// Pacing values (`base_delay_ms`, `max_attempts`) are process-wide defaults;
/// individual storefronts may override them in the storefront index file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Path to the YAML storefront index.
    pub storefronts_path: PathBuf,
    /// Directory holding the per-store category seed files named by the index.
    pub seeds_dir: PathBuf,
    /// Directory for current per-store snapshot files.
    pub output_dir: PathBuf,
    /// Directory that archived (replaced) snapshots are moved into.
    pub archive_dir: PathBuf,
    /// Total request timeout, covering connect + read.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Transport-level retry budget for retryable status codes.
    pub transport_retries: u32,
    /// Base factor for transport backoff: `factor * 2^retry_index` seconds.
    pub backoff_factor: f64,
    /// Attempt ceiling for the throttled executor (terminal failure past it).
    pub max_attempts: u32,
    /// Base pre-request delay; jittered by ±20% before every attempt.
    pub base_delay_ms: u64,
    /// How many storefronts crawl concurrently. Within one storefront all
    /// fetches stay sequential.
    pub max_concurrent_stores: usize,
    /// Accept storefronts with broken certificate chains. On by default; set
    /// `STORECRAWL_ACCEPT_INVALID_CERTS=false` for strict verification.
    pub accept_invalid_certs: bool,
    /// Cadence of the per-store status line while a run is in flight.
    pub status_interval_secs: u64,
}
