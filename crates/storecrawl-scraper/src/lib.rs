pub mod adapter;
pub mod engine;
pub mod error;
pub mod paging;
pub mod throttle;
pub mod transport;

pub use adapter::{AdapterError, SiteAdapter};
pub use engine::StorefrontScraper;
pub use error::ScrapeError;
pub use throttle::Throttle;
pub use transport::{TransportClient, TransportConfig, RETRYABLE_STATUSES};
