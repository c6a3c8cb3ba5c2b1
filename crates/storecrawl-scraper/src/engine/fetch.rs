//! Product fetch with run-scoped dedup, and per-storefront aggregation.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use storecrawl_core::ProductRecord;

use super::StorefrontScraper;

impl StorefrontScraper {
    /// Fetches and extracts one product page at most once per run.
    ///
    /// Returns `None` when `url` was already visited this run — a skip, not
    /// an error; the same product routinely appears in several categories.
    /// A fetch or extraction failure yields an `{error, product_url}` record
    /// so one bad product never aborts the category or the storefront.
    pub async fn fetch_product(
        &self,
        url: &str,
        visited: &mut HashSet<String>,
    ) -> Option<ProductRecord> {
        if !visited.insert(url.to_owned()) {
            tracing::debug!(store = %self.store, url, "product already visited this run — skipping");
            return None;
        }

        let body = match self.throttle.get(url).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(
                    store = %self.store,
                    url,
                    error = %err,
                    "product fetch failed — emitting error record"
                );
                return Some(ProductRecord::failed(url, err.to_string()));
            }
        };

        match self.adapter.extract_product_record(&body, url) {
            Ok(mut record) => {
                // The URL is the record's identity; adapters don't get to
                // change it.
                record.product_url = url.to_owned();
                record.dedupe_images();
                Some(record)
            }
            Err(err) => {
                tracing::warn!(
                    store = %self.store,
                    url,
                    error = %err,
                    "product extraction failed — emitting error record"
                );
                Some(ProductRecord::failed(url, err.to_string()))
            }
        }
    }

    /// Crawls every category in seed order and returns the storefront's full
    /// record list, deduplicated across categories.
    pub async fn scrape(&self, categories: &[String]) -> Vec<ProductRecord> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut records: Vec<ProductRecord> = Vec::new();

        for category_url in categories {
            let links = self.collect_category(category_url).await;
            for url in &links {
                if let Some(record) = self.fetch_product(url, &mut visited).await {
                    if let Some(counter) = &self.progress {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                    records.push(record);
                }
            }
        }

        let errors = records.iter().filter(|r| r.is_error()).count();
        tracing::info!(
            store = %self.store,
            categories = categories.len(),
            records = records.len(),
            errors,
            "storefront scrape complete"
        );
        records
    }
}
