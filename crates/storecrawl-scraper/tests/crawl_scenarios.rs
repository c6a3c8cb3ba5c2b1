//! Crawl engine scenarios against wiremock: pagination termination, dedup
//! across categories, partial-failure isolation, and the end-to-end
//! category → records flow.
//!
//! The test adapter reads a trivial line-oriented page format
//! (`link: <href>`, `title: <text>`, ...) so listing/product bodies stay
//! readable inside the mocks. Real adapters parse HTML; the engine never
//! cares either way.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storecrawl_core::ProductRecord;
use storecrawl_scraper::{
    AdapterError, SiteAdapter, StorefrontScraper, Throttle, TransportClient, TransportConfig,
};

struct LineAdapter;

impl SiteAdapter for LineAdapter {
    fn extract_product_links(&self, listing_html: &str) -> Vec<String> {
        listing_html
            .lines()
            .filter_map(|line| line.trim().strip_prefix("link: "))
            .map(str::to_owned)
            .collect()
    }

    fn extract_product_record(
        &self,
        product_html: &str,
        product_url: &str,
    ) -> Result<ProductRecord, AdapterError> {
        if product_html.contains("malformed") {
            return Err(AdapterError::new(product_url, "no product block found"));
        }
        let mut record = ProductRecord::empty(product_url);
        for line in product_html.lines() {
            let line = line.trim();
            if let Some(title) = line.strip_prefix("title: ") {
                record.title = Some(title.to_owned());
            } else if let Some(price) = line.strip_prefix("price: ") {
                record.original_price = Some(price.to_owned());
            } else if let Some(image) = line.strip_prefix("image: ") {
                record.images.push(image.to_owned());
            }
        }
        Ok(record)
    }
}

/// Scraper wired for tests: no transport retries, single attempt, zero
/// delays — every mock failure is immediately terminal.
fn test_scraper(store: &str) -> StorefrontScraper {
    let transport = TransportClient::new(&TransportConfig {
        connect_timeout_secs: 5,
        request_timeout_secs: 5,
        retries: 0,
        backoff_factor: 0.0,
        accept_invalid_certs: false,
    })
    .expect("failed to build test TransportClient");
    StorefrontScraper::new(store, Throttle::new(transport, Duration::ZERO, 1), Arc::new(LineAdapter))
}

fn listing_body(links: &[&str]) -> String {
    links
        .iter()
        .map(|l| format!("link: {l}\n"))
        .collect::<String>()
}

async fn mount_product(server: &MockServer, route: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("title: {title}\nprice: 19.90\n")),
        )
        .expect(1)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// End-to-end scenario: one category, two products, listing exhausts on page 2
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_collects_two_products_in_listing_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_body(&["/products/p1", "/products/p2"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    mount_product(&server, "/products/p1", "First Product").await;
    mount_product(&server, "/products/p2", "Second Product").await;

    let scraper = test_scraper("scenario-store");
    let categories = vec![format!("{}/cat-a", server.uri())];
    let records = scraper.scrape(&categories).await;

    assert_eq!(records.len(), 2, "expected exactly two records");
    assert_eq!(
        records[0].product_url,
        format!("{}/products/p1", server.uri()),
        "listing order must be preserved"
    );
    assert_eq!(
        records[1].product_url,
        format!("{}/products/p2", server.uri())
    );
    assert_eq!(records[0].title.as_deref(), Some("First Product"));
    assert_eq!(records[1].title.as_deref(), Some("Second Product"));
    assert!(records.iter().all(|r| !r.is_error()));
}

// ---------------------------------------------------------------------------
// Pagination termination A: empty page ends the category in N+1 fetches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pagination_terminates_after_first_empty_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_body(&["/products/a", "/products/b", "/products/c"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(&["/products/d"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1) // N+1-th fetch, and no page=4 request ever happens
        .mount(&server)
        .await;

    let scraper = test_scraper("pagination-store");
    let links = scraper
        .collect_category(&format!("{}/cat-a", server.uri()))
        .await;

    let expected: Vec<String> = ["a", "b", "c", "d"]
        .iter()
        .map(|p| format!("{}/products/{p}", server.uri()))
        .collect();
    assert_eq!(links, expected, "links in page order, first-seen order");
}

// ---------------------------------------------------------------------------
// Pagination termination B: a page that repeats known links stops the loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pagination_stops_when_page_repeats_known_links() {
    let server = MockServer::start().await;

    let same_links = listing_body(&["/products/a", "/products/b"]);

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(same_links.clone()))
        .expect(1)
        .mount(&server)
        .await;

    // The storefront serves its last page for every page number past the
    // end; without the no-net-growth check this would loop to the cap.
    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(same_links))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = test_scraper("repeat-store");
    let links = scraper
        .collect_category(&format!("{}/cat-a", server.uri()))
        .await;

    assert_eq!(links.len(), 2, "no duplicates from the repeated page");
}

// ---------------------------------------------------------------------------
// Dedup: a product listed in two categories is fetched exactly once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn product_in_two_categories_is_fetched_once() {
    let server = MockServer::start().await;

    for (route, links) in [
        ("/cat-a", vec!["/products/p1", "/products/p2"]),
        ("/cat-b", vec!["/products/p2", "/products/p3"]),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(&links)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;
    }

    // expect(1) on each product is the dedup assertion: wiremock fails
    // verification if p2 is requested twice.
    mount_product(&server, "/products/p1", "P1").await;
    mount_product(&server, "/products/p2", "P2").await;
    mount_product(&server, "/products/p3", "P3").await;

    let scraper = test_scraper("dedup-store");
    let categories = vec![
        format!("{}/cat-a", server.uri()),
        format!("{}/cat-b", server.uri()),
    ];
    let records = scraper.scrape(&categories).await;

    assert_eq!(records.len(), 3, "p2 contributes one record, not two");
    let urls: Vec<&str> = records.iter().map(|r| r.product_url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/products/p1", server.uri()),
            format!("{}/products/p2", server.uri()),
            format!("{}/products/p3", server.uri()),
        ]
    );
}

// ---------------------------------------------------------------------------
// Partial failure isolation: one bad product, siblings unharmed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_product_becomes_error_record_without_aborting_category() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(&[
            "/products/p1",
            "/products/p2",
            "/products/p3",
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    mount_product(&server, "/products/p1", "P1").await;
    Mock::given(method("GET"))
        .and(path("/products/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("malformed"))
        .mount(&server)
        .await;
    mount_product(&server, "/products/p3", "P3").await;

    let scraper = test_scraper("isolation-store");
    let categories = vec![format!("{}/cat-a", server.uri())];
    let records = scraper.scrape(&categories).await;

    assert_eq!(records.len(), 3, "all three URLs must produce records");
    assert!(!records[0].is_error());
    assert!(records[1].is_error(), "second record should be the error record");
    assert_eq!(
        records[1].product_url,
        format!("{}/products/p2", server.uri())
    );
    assert!(records[1].title.is_none(), "error records carry no product data");
    assert!(!records[2].is_error());
    assert_eq!(records[2].title.as_deref(), Some("P3"));
}

// ---------------------------------------------------------------------------
// Listing failure: pagination stops, earlier pages kept, next category runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_fetch_failure_keeps_partial_results_and_continues() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(&["/products/p1"])))
        .mount(&server)
        .await;
    // Page 2 of cat-a is broken; transport retries are disabled so the
    // failure is immediately terminal for this category.
    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cat-b"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(&["/products/p2"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cat-b"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    mount_product(&server, "/products/p1", "P1").await;
    mount_product(&server, "/products/p2", "P2").await;

    let scraper = test_scraper("partial-store");
    let categories = vec![
        format!("{}/cat-a", server.uri()),
        format!("{}/cat-b", server.uri()),
    ];
    let records = scraper.scrape(&categories).await;

    assert_eq!(records.len(), 2, "page-1 result kept, next category crawled");
    assert_eq!(records[0].title.as_deref(), Some("P1"));
    assert_eq!(records[1].title.as_deref(), Some("P2"));
}

// ---------------------------------------------------------------------------
// Fetch stage details: error records for dead PDPs, image dedup, skip return
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dead_product_page_yields_error_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scraper = test_scraper("dead-pdp-store");
    let mut visited = HashSet::new();
    let url = format!("{}/products/gone", server.uri());
    let record = scraper
        .fetch_product(&url, &mut visited)
        .await
        .expect("first visit always yields a record");

    assert!(record.is_error());
    assert_eq!(record.product_url, url);

    // Second call with the same URL is a skip, not another fetch.
    assert!(scraper.fetch_product(&url, &mut visited).await.is_none());
}

#[tokio::test]
async fn extracted_images_are_deduplicated_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "title: Imaged\nimage: https://cdn.test/a.jpg\nimage: https://cdn.test/b.jpg\nimage: https://cdn.test/a.jpg\n",
        ))
        .mount(&server)
        .await;

    let scraper = test_scraper("image-store");
    let mut visited = HashSet::new();
    let record = scraper
        .fetch_product(&format!("{}/products/p1", server.uri()), &mut visited)
        .await
        .expect("expected a record");

    assert_eq!(
        record.images,
        vec!["https://cdn.test/a.jpg", "https://cdn.test/b.jpg"]
    );
}

#[tokio::test]
async fn progress_counter_tracks_produced_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_body(&["/products/p1", "/products/p2"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cat-a"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;
    mount_product(&server, "/products/p1", "P1").await;
    mount_product(&server, "/products/p2", "P2").await;

    let counter = Arc::new(AtomicUsize::new(0));
    let scraper = test_scraper("progress-store").with_progress(Arc::clone(&counter));
    let categories = vec![format!("{}/cat-a", server.uri())];
    let records = scraper.scrape(&categories).await;

    assert_eq!(records.len(), 2);
    assert_eq!(counter.load(Ordering::Relaxed), 2);
}
