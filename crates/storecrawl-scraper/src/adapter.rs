//! The seam between the shape-agnostic engine and per-storefront markup.

use storecrawl_core::ProductRecord;
use thiserror::Error;

/// Raised by an adapter when a page does not contain what it expects.
/// The fetch stage downgrades this to an error record; it never aborts a run.
#[derive(Debug, Error)]
#[error("extraction failed for {url}: {reason}")]
pub struct AdapterError {
    pub url: String,
    pub reason: String,
}

impl AdapterError {
    #[must_use]
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Per-storefront extraction pair. All HTML-shape knowledge lives behind
/// this trait; the crawl engine only ever sees links and records.
///
/// Implementations must be `Send + Sync`: one adapter instance is shared by
/// a storefront's crawl task and may be reused across runs.
pub trait SiteAdapter: Send + Sync {
    /// Pulls candidate product-detail URLs out of one listing page. Links
    /// may be relative; the crawl driver resolves them against the page URL.
    fn extract_product_links(&self, listing_html: &str) -> Vec<String>;

    /// Maps one product page into a [`ProductRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the page lacks the expected structure.
    fn extract_product_record(
        &self,
        product_html: &str,
        product_url: &str,
    ) -> Result<ProductRecord, AdapterError>;
}
