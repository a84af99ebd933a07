//! Held-out evaluation metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics computed once per training run on the evaluation split.
///
/// Informational only; not part of the serving artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mean_absolute_error: f64,
    pub mean_squared_error: f64,
    pub r_squared: f64,
}

impl EvaluationReport {
    /// Evaluate predictions against ground truth.
    ///
    /// Slices are compared pairwise up to the shorter length.
    pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            mean_absolute_error: mean_absolute_error(y_true, y_pred),
            mean_squared_error: mean_squared_error(y_true, y_pred),
            r_squared: r_squared(y_true, y_pred),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE {:.2}, MSE {:.2}, R² {:.4}",
            self.mean_absolute_error, self.mean_squared_error, self.r_squared
        )
    }
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()))
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mean(y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)))
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant target gives 1.0 for a perfect prediction and 0.0 otherwise.
pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }

    let mean_true = y_true[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true[..n].iter().map(|t| (t - mean_true).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
