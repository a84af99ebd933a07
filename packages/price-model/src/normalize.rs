//! Free-text field normalization.
//!
//! Pure functions turning scraped price, mileage, and transmission text
//! into typed values. `None` (or `Err` for transmission) is the explicit
//! "unparsable" outcome; callers drop the row rather than guess.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    // First ASCII digit run, thousands separators allowed ("RM 45,000" -> "45,000")
    static ref PRICE_REGEX: Regex = Regex::new(r"[0-9][0-9,]*").unwrap();

    // Mileage token with an optional standalone K/k thousands marker.
    // The marker must not be followed by a letter, so "km" is a unit.
    static ref MILEAGE_REGEX: Regex =
        Regex::new(r"([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:([kK])(?:[^a-zA-Z0-9]|$))?").unwrap();
}

/// Parse a displayed price into a number.
///
/// Takes the first contiguous digit run (commas allowed), strips the
/// separators and parses it. Currency symbols and words around it are
/// ignored. Returns `None` when the text has no digits.
pub fn parse_price(text: &str) -> Option<f64> {
    let digits = PRICE_REGEX.find(text)?.as_str().replace(',', "");
    digits.parse::<f64>().ok()
}

/// Parse a displayed mileage into kilometres.
///
/// Each numeric token may carry a `K` suffix meaning thousands. One token
/// is returned as is; two tokens are a range and yield their mean
/// (`"5K - 10K km"` -> 7500). No tokens, or more than two, is unparsable.
pub fn parse_mileage(text: &str) -> Option<f64> {
    let mut values = Vec::with_capacity(2);

    for cap in MILEAGE_REGEX.captures_iter(text) {
        let number = cap.get(1)?.as_str().replace(',', "");
        let Ok(mut value) = number.parse::<f64>() else {
            continue;
        };
        if cap.get(2).is_some() {
            value *= 1000.0;
        }
        values.push(value);
    }

    match values.as_slice() {
        [single] => Some(*single),
        [low, high] => Some((low + high) / 2.0),
        _ => None,
    }
}

/// Gearbox type with the fixed model codes `Manual = 0`, `Automatic = 1`.
///
/// The codes are part of the model's feature layout and are checked when
/// a persisted model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub const ALL: [Transmission; 2] = [Transmission::Manual, Transmission::Automatic];

    /// Numeric code fed to the model.
    pub fn code(self) -> u32 {
        match self {
            Transmission::Manual => 0,
            Transmission::Automatic => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Manual => "Manual",
            Transmission::Automatic => "Automatic",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transmission text that matches neither gearbox type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized transmission: {value:?}")]
pub struct ParseTransmissionError {
    pub value: String,
}

impl FromStr for Transmission {
    type Err = ParseTransmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();

        if lower.contains("auto") || matches!(lower.as_str(), "at" | "a/t" | "cvt" | "dct" | "amt")
        {
            Ok(Transmission::Automatic)
        } else if lower.contains("manual") || matches!(lower.as_str(), "mt" | "m/t") {
            Ok(Transmission::Manual)
        } else {
            Err(ParseTransmissionError {
                value: s.to_string(),
            })
        }
    }
}
