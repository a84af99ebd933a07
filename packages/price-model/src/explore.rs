//! Summary statistics behind the exploratory charts.
//!
//! Only the numbers are produced here; rendering belongs to the UI.

use serde::Serialize;

use crate::dataset::CleanListing;
use crate::normalize::Transmission;

pub const PRICE_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreReport {
    pub rows: usize,
    pub price_histogram: Histogram,
    pub mileage_vs_price: Vec<ScatterPoint>,
    pub price_by_transmission: Vec<TransmissionSummary>,
}

/// Equal-width bins over `[min, max]`; the last bin is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub mileage: f64,
    pub price: f64,
}

/// Box-plot numbers for one transmission group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransmissionSummary {
    pub transmission: Transmission,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn explore(listings: &[CleanListing]) -> ExploreReport {
    let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();

    ExploreReport {
        rows: listings.len(),
        price_histogram: histogram(&prices, PRICE_HISTOGRAM_BINS),
        mileage_vs_price: listings
            .iter()
            .map(|l| ScatterPoint {
                mileage: l.mileage,
                price: l.price,
            })
            .collect(),
        price_by_transmission: Transmission::ALL
            .iter()
            .filter_map(|&t| {
                let group: Vec<f64> = listings
                    .iter()
                    .filter(|l| l.transmission == t)
                    .map(|l| l.price)
                    .collect();
                summarize(t, group)
            })
            .collect(),
    }
}

pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let mut counts = vec![0; bins];

    if values.is_empty() {
        return Histogram {
            min: 0.0,
            max: 0.0,
            bin_width: 0.0,
            counts,
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bin_width = (max - min) / bins as f64;

    for &v in values {
        let bin = if bin_width > 0.0 {
            (((v - min) / bin_width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[bin] += 1;
    }

    Histogram {
        min,
        max,
        bin_width,
        counts,
    }
}

fn summarize(transmission: Transmission, mut values: Vec<f64>) -> Option<TransmissionSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    Some(TransmissionSummary {
        transmission,
        count: values.len(),
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
