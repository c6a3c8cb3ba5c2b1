//! Normalized product output schema.
//!
//! One [`ProductRecord`] per product URL per run. Field names here are the
//! wire contract: snapshot files serialize them verbatim and the downstream
//! loader maps them to JSON-typed columns, so renames are breaking changes.
//!
//! Records are constructed with all-null defaults before parsing begins, so a
//! partial extraction still yields a record keyed by `product_url` rather
//! than nothing at all.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product scraped from one storefront, normalized across all stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Canonical product page URL; unique key within a store's run.
    pub product_url: String,
    pub title: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    /// ISO code or currency symbol, exactly as the storefront presents it.
    pub currency: Option<String>,
    /// Decimal string (e.g. `"49.90"`); money never goes through floats.
    pub original_price: Option<String>,
    pub sale_price: Option<String>,
    /// Absolute image URLs, first-seen order, deduplicated.
    #[serde(default)]
    pub images: Vec<String>,
    /// `None` when the page does not state availability either way.
    pub availability: Option<bool>,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
    /// Store-specific key/value pairs (breadcrumbs, fabric, care
    /// instructions). Deliberately untyped; every store contributes
    /// different keys.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Auxiliary extracted text that fits nowhere above. Passed through
    /// untouched; the engine never reads it.
    #[serde(default)]
    pub raw_data: Map<String, Value>,
    /// Set instead of the descriptive fields when fetch or extraction failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One attribute combination of a product (a size/color pairing and the
/// like), with its own availability flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRecord {
    /// The combination's option keys, e.g. `{"size": "M", "color": "navy"}`.
    /// Serialized inline so the combination reads as one flat object.
    #[serde(flatten)]
    pub options: Map<String, Value>,
    /// Defaults to `true` when the store omits it (optimistic assumption).
    #[serde(default = "default_available")]
    pub availability: bool,
}

/// Default for [`VariantRecord::availability`] when the field is absent.
/// Serde's `default = "..."` attribute requires a function path.
fn default_available() -> bool {
    true
}

impl ProductRecord {
    /// An all-null record for `product_url`, the starting point every
    /// extraction fills in.
    #[must_use]
    pub fn empty(product_url: &str) -> Self {
        Self {
            product_url: product_url.to_owned(),
            title: None,
            sku: None,
            description: None,
            brand: None,
            category: None,
            currency: None,
            original_price: None,
            sale_price: None,
            images: Vec::new(),
            availability: None,
            variants: Vec::new(),
            attributes: Map::new(),
            raw_data: Map::new(),
            error: None,
        }
    }

    /// The `{error, product_url}` record emitted when a product's fetch or
    /// extraction fails; one bad product never aborts a run.
    #[must_use]
    pub fn failed(product_url: &str, error: impl Into<String>) -> Self {
        let mut record = Self::empty(product_url);
        record.error = Some(error.into());
        record
    }

    /// `true` when this record reports a failure rather than product data.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Drops repeated image URLs, keeping first-seen order.
    pub fn dedupe_images(&mut self) {
        self.images = dedupe_preserving_order(std::mem::take(&mut self.images));
    }
}

/// Order-preserving dedup: keeps the first occurrence of each string.
#[must_use]
pub fn dedupe_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
