//! Generic schema.org JSON-LD adapter.
//!
//! Many storefronts embed a `Product` node in
//! `<script type="application/ld+json">` on their detail pages, which makes
//! this the one adapter that works across stores without bespoke selector
//! work. Listing pages are mined for anchors whose href matches the store's
//! product-link pattern.
//!
//! Price mapping: a lone `offers.price` is the listed price and lands in
//! `original_price`; `sale_price` stays empty because plain JSON-LD offers
//! carry no pre-discount price to compare against.

use regex::Regex;
use serde_json::{json, Map, Value};

use storecrawl_core::{ProductRecord, VariantRecord};
use storecrawl_scraper::{AdapterError, SiteAdapter};

pub struct JsonLdAdapter {
    link_pattern: Regex,
    href: Regex,
    script: Regex,
}

impl JsonLdAdapter {
    /// `link_pattern` is matched against each anchor href on a listing page;
    /// only matching hrefs are treated as product links.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(link_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            link_pattern: Regex::new(link_pattern)?,
            href: Regex::new(r#"href\s*=\s*["']([^"']+)["']"#)?,
            script: Regex::new(
                r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
            )?,
        })
    }

    /// Finds the first JSON-LD `Product` node in the page: top-level object,
    /// array element, or `@graph` member.
    fn find_product_node(&self, html: &str) -> Option<Value> {
        for cap in self.script.captures_iter(html) {
            let Some(json_text) = cap.get(1) else { continue };
            let Ok(value) = serde_json::from_str::<Value>(json_text.as_str()) else {
                continue;
            };

            let mut candidates: Vec<Value> = if value.is_array() {
                value.as_array().cloned().unwrap_or_default()
            } else {
                vec![value]
            };

            // Expand @graph containers: many sites wrap structured data
            // inside {"@graph": [...]} at the top level.
            let mut expanded = Vec::new();
            for item in &candidates {
                if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
                    expanded.extend(graph.iter().cloned());
                }
            }
            candidates.extend(expanded);

            for item in candidates {
                if is_product(&item) {
                    return Some(item);
                }
            }
        }
        None
    }
}

impl SiteAdapter for JsonLdAdapter {
    fn extract_product_links(&self, listing_html: &str) -> Vec<String> {
        self.href
            .captures_iter(listing_html)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().to_owned())
            .filter(|href| self.link_pattern.is_match(href))
            .collect()
    }

    fn extract_product_record(
        &self,
        product_html: &str,
        product_url: &str,
    ) -> Result<ProductRecord, AdapterError> {
        let node = self.find_product_node(product_html).ok_or_else(|| {
            AdapterError::new(product_url, "no JSON-LD Product node in page")
        })?;

        let mut record = ProductRecord::empty(product_url);
        record.title = string_field(&node, "name");
        record.sku = string_field(&node, "sku");
        record.description = string_field(&node, "description");
        record.category = string_field(&node, "category");
        record.brand = brand_name(&node);
        record.images = image_urls(node.get("image"));

        let offers = collect_offers(node.get("offers"));
        if let Some(first) = offers.first() {
            record.currency = string_field(first, "priceCurrency");
            record.original_price = price_string(first);
            record.availability = availability_of(first);
        }
        if offers.len() > 1 {
            record.variants = offers.iter().map(offer_variant).collect();
            // The product is available if any variant is.
            record.availability = Some(record.variants.iter().any(|v| v.availability));
        }

        Ok(record)
    }
}

/// `@type` may be a plain string or an array of strings.
fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("Product"),
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product")),
        _ => false,
    }
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `brand` appears both as `{"@type": "Brand", "name": "..."}` and as a
/// plain string.
fn brand_name(item: &Value) -> Option<String> {
    match item.get("brand")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
        _ => None,
    }
}

/// `image` may be a string, an array of strings, or an array of
/// `ImageObject`s with a `url` key.
fn image_urls(image: Option<&Value>) -> Vec<String> {
    match image {
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Flattens `offers` (object or array) into a list of offer nodes.
fn collect_offers(offers: Option<&Value>) -> Vec<Value> {
    match offers {
        Some(object @ Value::Object(_)) => vec![object.clone()],
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).cloned().collect(),
        _ => Vec::new(),
    }
}

/// Prices arrive as strings or numbers; `AggregateOffer` uses `lowPrice`.
fn price_string(offer: &Value) -> Option<String> {
    string_field(offer, "price").or_else(|| string_field(offer, "lowPrice"))
}

/// schema.org availability URLs: `https://schema.org/InStock` and friends.
fn availability_of(offer: &Value) -> Option<bool> {
    let availability = offer.get("availability")?.as_str()?;
    if availability.contains("InStock") || availability.contains("LimitedAvailability") {
        Some(true)
    } else if availability.contains("OutOfStock")
        || availability.contains("SoldOut")
        || availability.contains("Discontinued")
    {
        Some(false)
    } else {
        None
    }
}

/// One offer of a multi-offer product becomes a variant combination keyed
/// by whatever identifying fields the offer carries.
fn offer_variant(offer: &Value) -> VariantRecord {
    let mut options = Map::new();
    if let Some(name) = string_field(offer, "name") {
        options.insert("title".to_string(), json!(name));
    }
    if let Some(sku) = string_field(offer, "sku") {
        options.insert("sku".to_string(), json!(sku));
    }
    if let Some(price) = price_string(offer) {
        options.insert("price".to_string(), json!(price));
    }
    VariantRecord {
        options,
        availability: availability_of(offer).unwrap_or(true),
    }
}
