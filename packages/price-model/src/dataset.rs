//! Row-wise cleaning of the raw dataset.
//!
//! Every field of a [`CleanListing`] is resolved. A raw row that fails any
//! normalization is dropped whole and counted under the first reason that
//! applied, so the data loss is reproducible and countable.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use listing_collector::{RawDataset, RawListing, NOT_AVAILABLE};

use crate::normalize::{parse_mileage, parse_price, Transmission};

/// A fully resolved listing, ready for encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanListing {
    /// Kilometres, non-negative
    pub mileage: f64,
    /// Positive
    pub price: f64,
    pub transmission: Transmission,
    pub location: String,
}

/// Why a raw row was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    MalformedRecord,
    UnparsablePrice,
    NonPositivePrice,
    UnparsableMileage,
    UnknownTransmission,
    MissingLocation,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionReason::MalformedRecord => "malformed_record",
            ExclusionReason::UnparsablePrice => "unparsable_price",
            ExclusionReason::NonPositivePrice => "non_positive_price",
            ExclusionReason::UnparsableMileage => "unparsable_mileage",
            ExclusionReason::UnknownTransmission => "unknown_transmission",
            ExclusionReason::MissingLocation => "missing_location",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of rows read, kept, and excluded per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl CleaningReport {
    pub fn excluded_rows(&self) -> usize {
        self.excluded.values().sum()
    }

    pub fn count(&self, reason: ExclusionReason) -> usize {
        self.excluded.get(&reason).copied().unwrap_or(0)
    }

    /// Count records the CSV reader skipped as read and excluded.
    pub fn record_malformed(&mut self, records: usize) {
        if records == 0 {
            return;
        }
        self.total_rows += records;
        *self
            .excluded
            .entry(ExclusionReason::MalformedRecord)
            .or_insert(0) += records;
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} kept, {} excluded",
            self.total_rows,
            self.kept_rows,
            self.excluded_rows()
        )?;
        if !self.excluded.is_empty() {
            let parts: Vec<String> = self
                .excluded
                .iter()
                .map(|(reason, n)| format!("{}: {}", reason, n))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Normalize one raw row.
pub fn clean_row(raw: &RawListing) -> Result<CleanListing, ExclusionReason> {
    let price = parse_price(&raw.price)
        .filter(|p| p.is_finite())
        .ok_or(ExclusionReason::UnparsablePrice)?;
    if price <= 0.0 {
        return Err(ExclusionReason::NonPositivePrice);
    }

    let mileage = parse_mileage(&raw.mileage)
        .filter(|m| m.is_finite() && *m >= 0.0)
        .ok_or(ExclusionReason::UnparsableMileage)?;

    let transmission = raw
        .transmission
        .parse::<Transmission>()
        .map_err(|_| ExclusionReason::UnknownTransmission)?;

    let location = raw.location.trim();
    if location.is_empty() || location == NOT_AVAILABLE {
        return Err(ExclusionReason::MissingLocation);
    }

    Ok(CleanListing {
        mileage,
        price,
        transmission,
        location: location.to_string(),
    })
}

/// Normalize every row, dropping the ones that do not fully resolve.
pub fn clean(rows: &[RawListing]) -> (Vec<CleanListing>, CleaningReport) {
    let mut report = CleaningReport {
        total_rows: rows.len(),
        ..Default::default()
    };
    let mut kept = Vec::with_capacity(rows.len());

    for (index, raw) in rows.iter().enumerate() {
        match clean_row(raw) {
            Ok(listing) => kept.push(listing),
            Err(reason) => {
                debug!(row = index, reason = %reason, name = %raw.name, "Excluding row");
                *report.excluded.entry(reason).or_insert(0) += 1;
            }
        }
    }

    report.kept_rows = kept.len();
    (kept, report)
}

/// Clean a dataset read from CSV, counting its skipped records too.
pub fn clean_dataset(data: &RawDataset) -> (Vec<CleanListing>, CleaningReport) {
    let (kept, mut report) = clean(&data.listings);
    report.record_malformed(data.malformed_records);
    (kept, report)
}
