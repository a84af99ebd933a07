//! Used-Car Listing Collector
//!
//! Walks a marketplace's paginated search results one page at a time and
//! streams every listing card into a CSV file.
//!
//! # Failure model
//!
//! - A missing field inside a card becomes `"N/A"` for that field only
//! - A page that does not load in time, fails, or has no listings ends
//!   the crawl gracefully; earlier pages stay on disk
//! - The output is flushed on every exit path, including cancellation
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_collector::{CollectorConfig, CsvSink, HttpPageSource, ListingCollector};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = CollectorConfig::new().with_max_pages(10);
//! let source = HttpPageSource::new(&config)?;
//! let collector = ListingCollector::new(source, config)?;
//!
//! let mut sink = CsvSink::create("carlist_data.csv")?;
//! let report = collector.run(&mut sink, &CancellationToken::new()).await?;
//! sink.finish()?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The `PageSource` abstraction
//! - [`sources`] - Page source implementations (HTTP)
//! - [`extract`] - CSS-selector card extraction
//! - [`collector`] - The crawl loop
//! - [`sink`] - CSV output and input
//! - [`testing`] - Mock page source for tests

pub mod collector;
pub mod error;
pub mod extract;
pub mod sink;
pub mod sources;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use collector::{CollectReport, ListingCollector, StopReason};
pub use error::{CollectError, CollectResult};
pub use extract::{extract_card, extract_page, CompiledSelectors, PageExtraction};
pub use sink::{read_listings, read_listings_from, CsvSink, RawDataset};
pub use sources::HttpPageSource;
pub use testing::MockPageSource;
pub use traits::PageSource;
pub use types::{
    CollectorConfig, DelayRange, FieldLookup, ListingSelectors, RawListing, CSV_HEADER,
    NOT_AVAILABLE,
};
