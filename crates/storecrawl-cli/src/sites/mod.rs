//! Site adapter registry.
//!
//! Each storefront entry names an adapter key; bespoke per-store adapters
//! register here next to the generic `jsonld` one. The engine only ever
//! sees the [`SiteAdapter`] trait object.

mod jsonld;

use std::sync::Arc;

use storecrawl_core::StorefrontConfig;
use storecrawl_scraper::SiteAdapter;

pub use jsonld::JsonLdAdapter;

/// Product links must contain this when a store configures no pattern of
/// its own; it matches the detail-page path used by most of the corpus.
const DEFAULT_LINK_PATTERN: &str = "/products/";

/// Builds the adapter a storefront entry asks for.
///
/// # Errors
///
/// Fails on an unknown adapter key or an invalid `product_link_pattern`
/// regex — both are configuration mistakes surfaced at store startup.
pub fn resolve(store: &StorefrontConfig) -> anyhow::Result<Arc<dyn SiteAdapter>> {
    match store.adapter.as_str() {
        "jsonld" => {
            let pattern = store
                .product_link_pattern
                .as_deref()
                .unwrap_or(DEFAULT_LINK_PATTERN);
            let adapter = JsonLdAdapter::new(pattern).map_err(|e| {
                anyhow::anyhow!(
                    "storefront '{}' has an invalid product_link_pattern: {e}",
                    store.name
                )
            })?;
            Ok(Arc::new(adapter))
        }
        other => anyhow::bail!(
            "storefront '{}' names unknown adapter '{other}'",
            store.name
        ),
    }
}
