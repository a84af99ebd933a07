//! The page-by-page crawl loop.
//!
//! One page at a time, one card at a time:
//!
//! 1. Fetch page `p` within the configured wait. A timeout or fetch
//!    failure ends the crawl; it is not an error.
//! 2. Extract the listing cards. Zero cards ends the crawl.
//! 3. Write every card as a CSV row, with per-field sentinel fallback.
//! 4. Stop at the page ceiling, otherwise sleep a random delay and go on.
//!
//! Every exit path flushes the sink, so rows from completed pages are
//! always on disk.

use serde::Serialize;
use std::fmt;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CollectResult;
use crate::extract::{extract_page, CompiledSelectors};
use crate::sink::CsvSink;
use crate::traits::PageSource;
use crate::types::CollectorConfig;

/// Why a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// A page had no listing containers (end of results or layout change)
    NoListings { page: u32 },
    /// A page did not load within the configured wait
    WaitTimeout { page: u32 },
    /// The page source reported an error
    FetchFailed { page: u32, error: String },
    /// The configured page ceiling was reached
    PageCeiling { max_pages: u32 },
    /// The caller cancelled the crawl
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NoListings { page } => write!(f, "no listings on page {}", page),
            StopReason::WaitTimeout { page } => write!(f, "page {} did not load in time", page),
            StopReason::FetchFailed { page, error } => {
                write!(f, "page {} failed to load: {}", page, error)
            }
            StopReason::PageCeiling { max_pages } => {
                write!(f, "reached page ceiling of {}", max_pages)
            }
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    /// Pages whose HTML was loaded (including the empty one that ended the run)
    pub pages_visited: u32,
    pub rows_written: usize,
    /// Fields replaced by the sentinel
    pub substituted_fields: usize,
    pub stop_reason: StopReason,
}

/// Drives a paginated crawl against a [`PageSource`].
pub struct ListingCollector<S: PageSource> {
    source: S,
    config: CollectorConfig,
    selectors: CompiledSelectors,
}

impl<S: PageSource> ListingCollector<S> {
    /// Validate the config and compile its selectors.
    pub fn new(source: S, config: CollectorConfig) -> CollectResult<Self> {
        config.validate()?;
        let selectors = CompiledSelectors::compile(&config.selectors)?;
        Ok(Self {
            source,
            config,
            selectors,
        })
    }

    /// Crawl until a stop condition, streaming rows into `sink`.
    ///
    /// Only sink I/O failures are returned as errors; every page-level
    /// problem becomes a [`StopReason`].
    pub async fn run<W: Write>(
        &self,
        sink: &mut CsvSink<W>,
        cancel: &CancellationToken,
    ) -> CollectResult<CollectReport> {
        info!(
            source = self.source.name(),
            base_url = %self.config.base_url,
            max_pages = self.config.max_pages,
            "Listing crawl starting"
        );

        let mut pages_visited = 0u32;
        let mut rows_written = 0usize;
        let mut substituted_fields = 0usize;
        let mut page = 1u32;

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let url = self.config.page_url(page);
            debug!(page, url = %url, "Fetching page");

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                res = tokio::time::timeout(self.config.page_wait, self.source.fetch(&url)) => Some(res),
            };
            let Some(fetched) = fetched else {
                break StopReason::Cancelled;
            };

            let html = match fetched {
                Ok(Ok(html)) => html,
                Ok(Err(e)) => {
                    warn!(page, url = %url, error = %e, "Page failed to load, stopping");
                    break StopReason::FetchFailed {
                        page,
                        error: e.to_string(),
                    };
                }
                Err(_) => {
                    warn!(
                        page,
                        wait_ms = self.config.page_wait.as_millis() as u64,
                        "No listings appeared in time, stopping"
                    );
                    break StopReason::WaitTimeout { page };
                }
            };
            pages_visited += 1;

            let extraction = extract_page(&html, &self.selectors);
            if extraction.is_empty() {
                info!(page, "No listings found, stopping");
                break StopReason::NoListings { page };
            }

            info!(page, listings = extraction.listings.len(), "Found car listings");
            for listing in &extraction.listings {
                sink.write(listing)?;
            }
            sink.flush()?;
            rows_written += extraction.listings.len();
            substituted_fields += extraction.substituted_fields;

            if page >= self.config.max_pages {
                break StopReason::PageCeiling {
                    max_pages: self.config.max_pages,
                };
            }
            page += 1;

            let pause = self.config.delay.sample(&mut rand::thread_rng());
            debug!(pause_ms = pause.as_millis() as u64, "Waiting before next page");
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(pause) => false,
            };
            if cancelled {
                break StopReason::Cancelled;
            }
        };

        sink.flush()?;

        info!(
            pages_visited,
            rows_written,
            substituted_fields,
            stop_reason = %stop_reason,
            "Listing crawl completed"
        );

        Ok(CollectReport {
            pages_visited,
            rows_written,
            substituted_fields,
            stop_reason,
        })
    }
}
