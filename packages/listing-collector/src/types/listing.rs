//! Raw listing rows as scraped from a results page.

use serde::{Deserialize, Serialize};

/// Placeholder written for any field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Column header of the raw dataset, in output order.
pub const CSV_HEADER: [&str; 5] = ["Car Name", "Transmission", "Mileage", "Price", "Location"];

/// One scraped car-for-sale card.
///
/// Every field is free text exactly as displayed on the page, or
/// [`NOT_AVAILABLE`] when that field's element was missing. Rows are
/// written once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(rename = "Car Name")]
    pub name: String,

    #[serde(rename = "Transmission")]
    pub transmission: String,

    #[serde(rename = "Mileage")]
    pub mileage: String,

    #[serde(rename = "Price")]
    pub price: String,

    #[serde(rename = "Location")]
    pub location: String,
}

impl RawListing {
    /// Compose a row from the five per-field lookups.
    pub fn from_lookups(
        name: FieldLookup,
        transmission: FieldLookup,
        mileage: FieldLookup,
        price: FieldLookup,
        location: FieldLookup,
    ) -> Self {
        Self {
            name: name.into_text(),
            transmission: transmission.into_text(),
            mileage: mileage.into_text(),
            price: price.into_text(),
            location: location.into_text(),
        }
    }

    /// Fields in CSV column order.
    pub fn as_record(&self) -> [&str; 5] {
        [
            &self.name,
            &self.transmission,
            &self.mileage,
            &self.price,
            &self.location,
        ]
    }

    /// Number of fields holding the sentinel.
    pub fn missing_fields(&self) -> usize {
        self.as_record()
            .iter()
            .filter(|v| **v == NOT_AVAILABLE)
            .count()
    }
}

/// Outcome of looking up a single field inside a listing card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLookup {
    /// Element found with non-empty text (already trimmed)
    Found(String),
    /// Element absent or empty
    Missing,
}

impl FieldLookup {
    /// Build from optional raw text; blank text counts as missing.
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) if !t.trim().is_empty() => Self::Found(t.trim().to_string()),
            _ => Self::Missing,
        }
    }

    /// Resolve to the output text, substituting the sentinel.
    pub fn into_text(self) -> String {
        match self {
            Self::Found(text) => text,
            Self::Missing => NOT_AVAILABLE.to_string(),
        }
    }
}
