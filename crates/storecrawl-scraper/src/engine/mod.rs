//! Per-storefront crawl engine: category pagination, product fetch with
//! run-scoped dedup, and record aggregation.

mod crawl;
mod fetch;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::adapter::SiteAdapter;
use crate::throttle::Throttle;

/// Pagination cap per category. Prevents infinite loops on storefronts whose
/// termination signals are both broken (e.g. every page links every product).
pub(crate) const MAX_PAGES: u32 = 200;

/// One storefront's crawl unit: a throttled transport plus the store's
/// adapter. Owns nothing shared with other storefronts, so stores never
/// contend on pools or dedup state.
pub struct StorefrontScraper {
    pub(crate) store: String,
    pub(crate) throttle: Throttle,
    pub(crate) adapter: Arc<dyn SiteAdapter>,
    /// Optional live record counter for orchestrator status lines.
    pub(crate) progress: Option<Arc<AtomicUsize>>,
}

impl StorefrontScraper {
    #[must_use]
    pub fn new(store: impl Into<String>, throttle: Throttle, adapter: Arc<dyn SiteAdapter>) -> Self {
        Self {
            store: store.into(),
            throttle,
            adapter,
            progress: None,
        }
    }

    /// Attach a counter incremented once per produced record, for periodic
    /// status reporting while a run is in flight.
    #[must_use]
    pub fn with_progress(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.progress = Some(counter);
        self
    }
}
