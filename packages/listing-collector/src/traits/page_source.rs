//! Page source trait for pluggable page loading.
//!
//! The collector only needs "give me the HTML of this results page". How
//! the page is obtained (plain HTTP, a headless browser, recorded
//! fixtures) is up to the implementation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use listing_collector::{HttpPageSource, PageSource};
//!
//! let source = HttpPageSource::new(&config)?;
//! let html = source.fetch("https://example.com/cars?page=1").await?;
//! ```

use async_trait::async_trait;

use crate::error::CollectResult;

/// Loads results pages for the collector.
///
/// Implementations must be cancel-safe: the collector wraps every call in
/// a timeout and drops the future when it expires.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url` and return its HTML.
    async fn fetch(&self, url: &str) -> CollectResult<String>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: PageSource + ?Sized> PageSource for std::sync::Arc<S> {
    async fn fetch(&self, url: &str) -> CollectResult<String> {
        (**self).fetch(url).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
