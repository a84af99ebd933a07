//! Typed errors for the listing collector.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Per-field and
//! per-page problems never surface here: they are recovered inside the
//! crawl loop. What remains are setup failures (bad selectors, bad URL
//! template, unwritable output) and the fetch errors a `PageSource`
//! reports before the collector turns them into a stop reason.

use thiserror::Error;

/// Errors that can occur while collecting listings.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A configured CSS selector failed to parse
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid URL produced from the base template
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Output stream failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected before the crawl started
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl CollectError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

/// Result type alias for collector operations.
pub type CollectResult<T> = std::result::Result<T, CollectError>;
