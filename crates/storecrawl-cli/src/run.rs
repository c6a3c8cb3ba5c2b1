//! Storefront orchestration: one task per store, bounded concurrency,
//! periodic status lines while the run is in flight.
//!
//! Stores share nothing — each gets its own transport pool, throttle, and
//! dedup state — so a storefront failing, stalling, or rate-limiting never
//! affects its siblings. Within a store, fetches stay strictly sequential.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use storecrawl_core::{load_category_seeds, AppConfig, StorefrontConfig};
use storecrawl_scraper::{StorefrontScraper, Throttle, TransportClient, TransportConfig};

/// Result of one storefront's run, for the end-of-run summary.
struct StoreOutcome {
    slug: String,
    records: usize,
    errors: usize,
    persisted: Option<PathBuf>,
    failed: bool,
}

/// Crawls every configured storefront (or just `only`) and persists one
/// snapshot per store.
///
/// # Errors
///
/// Fails when the storefront index cannot be loaded, `only` names an
/// unknown store, or every storefront fails — individual store failures
/// are logged and absorbed.
pub async fn run_all(config: &AppConfig, only: Option<&str>) -> anyhow::Result<()> {
    let index = storecrawl_core::load_storefronts(&config.storefronts_path)?;
    let mut stores = index.storefronts;
    if let Some(slug) = only {
        stores.retain(|s| s.slug() == slug);
        if stores.is_empty() {
            anyhow::bail!(
                "storefront '{slug}' not found in {}",
                config.storefronts_path.display()
            );
        }
    }
    if stores.is_empty() {
        tracing::warn!("no storefronts configured — nothing to do");
        return Ok(());
    }

    let counters: HashMap<String, Arc<AtomicUsize>> = stores
        .iter()
        .map(|s| (s.slug(), Arc::new(AtomicUsize::new(0))))
        .collect();

    let total = stores.len();
    tracing::info!(storefronts = total, "starting crawl run");
    let started = std::time::Instant::now();

    let mut in_flight = stream::iter(stores.iter())
        .map(|store| {
            let counter = Arc::clone(&counters[&store.slug()]);
            run_store(config, store, counter)
        })
        .buffer_unordered(config.max_concurrent_stores.max(1));

    let mut ticker =
        tokio::time::interval(Duration::from_secs(config.status_interval_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // the first tick fires immediately; skip it

    let mut outcomes: Vec<StoreOutcome> = Vec::with_capacity(total);
    let mut done: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            next = in_flight.next() => {
                let Some(outcome) = next else { break };
                done.insert(outcome.slug.clone());
                outcomes.push(outcome);
                if outcomes.len() == total {
                    break;
                }
            }
            _ = ticker.tick() => {
                for (slug, counter) in &counters {
                    if !done.contains(slug) {
                        tracing::info!(
                            store = %slug,
                            records_so_far = counter.load(Ordering::Relaxed),
                            "crawl in progress"
                        );
                    }
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.failed).count();
    let total_records: usize = outcomes.iter().map(|o| o.records).sum();
    let total_errors: usize = outcomes.iter().map(|o| o.errors).sum();
    let persisted = outcomes.iter().filter(|o| o.persisted.is_some()).count();
    tracing::info!(
        storefronts = total,
        failed,
        records = total_records,
        error_records = total_errors,
        snapshots = persisted,
        elapsed_secs = started.elapsed().as_secs(),
        "crawl run complete"
    );

    if failed == total {
        anyhow::bail!("all {total} storefronts failed");
    }
    Ok(())
}

/// One storefront, start to snapshot. Configuration problems (unknown
/// adapter, missing or empty seed file) fail the store immediately —
/// they are deployment errors, not retryable conditions. Everything past
/// startup is absorbed into the outcome.
async fn run_store(
    config: &AppConfig,
    store: &StorefrontConfig,
    counter: Arc<AtomicUsize>,
) -> StoreOutcome {
    let slug = store.slug();
    let failed = |slug: String| StoreOutcome {
        slug,
        records: 0,
        errors: 0,
        persisted: None,
        failed: true,
    };

    let adapter = match crate::sites::resolve(store) {
        Ok(adapter) => adapter,
        Err(err) => {
            tracing::error!(store = %slug, error = %err, "cannot resolve site adapter");
            return failed(slug);
        }
    };

    let seeds_path = config.seeds_dir.join(&store.categories_file);
    let categories = match load_category_seeds(&seeds_path) {
        Ok(categories) => categories,
        Err(err) => {
            tracing::error!(store = %slug, error = %err, "cannot load category seeds");
            return failed(slug);
        }
    };

    let transport = match TransportClient::new(&TransportConfig {
        connect_timeout_secs: config.connect_timeout_secs,
        request_timeout_secs: config.request_timeout_secs,
        retries: config.transport_retries,
        backoff_factor: config.backoff_factor,
        accept_invalid_certs: config.accept_invalid_certs,
    }) {
        Ok(transport) => transport,
        Err(err) => {
            tracing::error!(store = %slug, error = %err, "cannot build transport client");
            return failed(slug);
        }
    };

    let base_delay = Duration::from_millis(store.base_delay_ms.unwrap_or(config.base_delay_ms));
    let max_attempts = store.max_attempts.unwrap_or(config.max_attempts);
    let scraper = StorefrontScraper::new(
        slug.clone(),
        Throttle::new(transport, base_delay, max_attempts),
        adapter,
    )
    .with_progress(counter);

    tracing::info!(store = %slug, categories = categories.len(), "storefront crawl starting");
    let records = scraper.scrape(&categories).await;
    let errors = records.iter().filter(|r| r.is_error()).count();

    let persisted = match storecrawl_snapshot::persist_snapshot(
        &config.output_dir,
        &config.archive_dir,
        &slug,
        &records,
    ) {
        Ok(path) => path,
        Err(err) => {
            // Persistence failure costs this store its snapshot, nothing more.
            tracing::error!(store = %slug, error = %err, "failed to persist snapshot");
            None
        }
    };

    StoreOutcome {
        slug,
        records: records.len(),
        errors,
        persisted,
        failed: false,
    }
}
