//! Category pagination: listing pages → unique product URLs.

use std::collections::HashSet;

use crate::paging::{resolve_absolute, with_page};

use super::{StorefrontScraper, MAX_PAGES};

impl StorefrontScraper {
    /// Walks one category's listing pages and collects product-detail URLs
    /// in page order, first-seen order within a page.
    ///
    /// Pagination stops when a page yields no candidates at all (listing
    /// exhausted) or no candidates that are new (storefronts that repeat
    /// their last page forever past the end). A page fetch failure stops
    /// this category but keeps everything collected so far — the caller
    /// moves on to the next category rather than losing the run.
    pub async fn collect_category(&self, category_url: &str) -> Vec<String> {
        let mut collected: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page: u32 = 1;

        loop {
            if page > MAX_PAGES {
                tracing::warn!(
                    store = %self.store,
                    category = %category_url,
                    max_pages = MAX_PAGES,
                    "pagination cap hit — stopping category"
                );
                break;
            }

            let page_url = if page == 1 {
                category_url.to_owned()
            } else {
                match with_page(category_url, page) {
                    Ok(url) => url,
                    Err(err) => {
                        tracing::error!(
                            store = %self.store,
                            category = %category_url,
                            error = %err,
                            "cannot build listing page URL — stopping category"
                        );
                        break;
                    }
                }
            };

            let body = match self.throttle.get(&page_url).await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(
                        store = %self.store,
                        category = %category_url,
                        page,
                        error = %err,
                        "listing page fetch failed — keeping pages collected so far"
                    );
                    break;
                }
            };

            let candidates = self.adapter.extract_product_links(&body);
            if candidates.is_empty() {
                tracing::debug!(
                    store = %self.store,
                    category = %category_url,
                    page,
                    "listing exhausted"
                );
                break;
            }

            let mut grew = false;
            for candidate in candidates {
                let Some(absolute) = resolve_absolute(&page_url, &candidate) else {
                    tracing::debug!(
                        store = %self.store,
                        candidate = %candidate,
                        "dropping unresolvable product link"
                    );
                    continue;
                };
                if seen.insert(absolute.clone()) {
                    collected.push(absolute);
                    grew = true;
                }
            }

            if !grew {
                tracing::debug!(
                    store = %self.store,
                    category = %category_url,
                    page,
                    "page yielded no new links — stopping pagination"
                );
                break;
            }

            page += 1;
        }

        tracing::info!(
            store = %self.store,
            category = %category_url,
            pages = page,
            links = collected.len(),
            "category link collection finished"
        );
        collected
    }
}
