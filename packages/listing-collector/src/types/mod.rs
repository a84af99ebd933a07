//! Data types shared across the collector.

pub mod config;
pub mod listing;

pub use config::{CollectorConfig, DelayRange, ListingSelectors};
pub use listing::{FieldLookup, RawListing, CSV_HEADER, NOT_AVAILABLE};
