//! End-to-end training: clean, encode, split, fit, evaluate, persist.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use listing_collector::{read_listings, RawListing};

use crate::artifacts::{save_mapping, save_model, TrainedModel};
use crate::dataset::{clean, clean_dataset, CleanListing, CleaningReport};
use crate::encoding::{CategoricalEncoder, CategoryMapping};
use crate::error::{TrainError, TrainResult};
use crate::metrics::EvaluationReport;
use crate::regression::{FeatureVector, LinearRegression};
use crate::split::{train_test_split, MIN_SPLIT_ROWS};

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_L2: f64 = 1e-8;

/// Training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Share of clean rows held out for evaluation, in `(0, 1)`
    pub test_fraction: f64,
    /// Seed for the split shuffle
    pub seed: u64,
    /// Ridge damping on standardized features
    pub l2: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            l2: DEFAULT_L2,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn validate(&self) -> TrainResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrainError::Config {
                reason: format!("test fraction must be in (0, 1), got {}", self.test_fraction),
            });
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(TrainError::Config {
                reason: format!("l2 must be finite and non-negative, got {}", self.l2),
            });
        }
        Ok(())
    }
}

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub report: EvaluationReport,
    pub mapping: CategoryMapping,
    pub cleaning: CleaningReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Paths written by [`TrainingOutcome::persist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedArtifacts {
    pub model_path: PathBuf,
    pub mapping_path: PathBuf,
}

impl TrainingOutcome {
    /// Write the model and the location mapping into `dir`.
    pub fn persist(&self, dir: &Path) -> TrainResult<PersistedArtifacts> {
        let model_path = save_model(dir, &self.model)?;
        let mapping_path = save_mapping(dir, &self.mapping)?;

        info!(
            model = %model_path.display(),
            mapping = %mapping_path.display(),
            "Artifacts written"
        );

        Ok(PersistedArtifacts {
            model_path,
            mapping_path,
        })
    }
}

#[derive(Debug, Clone)]
struct Sample {
    features: FeatureVector,
    price: f64,
}

pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Read the raw CSV at `path` and train on it.
    pub fn train_from_csv(&self, path: &Path) -> TrainResult<TrainingOutcome> {
        self.config.validate()?;
        let data = read_listings(path)?;
        info!(
            path = %path.display(),
            rows = data.listings.len(),
            malformed = data.malformed_records,
            "Raw dataset loaded"
        );
        self.fit_cleaned(clean_dataset(&data))
    }

    pub fn train(&self, rows: &[RawListing]) -> TrainResult<TrainingOutcome> {
        self.config.validate()?;
        self.fit_cleaned(clean(rows))
    }

    fn fit_cleaned(
        &self,
        (listings, cleaning): (Vec<CleanListing>, CleaningReport),
    ) -> TrainResult<TrainingOutcome> {
        info!(
            total = cleaning.total_rows,
            kept = cleaning.kept_rows,
            excluded = cleaning.excluded_rows(),
            "Dataset cleaned"
        );
        for (reason, count) in &cleaning.excluded {
            warn!(reason = %reason, count, "Rows excluded");
        }

        if listings.is_empty() {
            return Err(TrainError::EmptyDataset { report: cleaning });
        }
        if listings.len() < MIN_SPLIT_ROWS {
            return Err(TrainError::InsufficientRows {
                needed: MIN_SPLIT_ROWS,
                got: listings.len(),
            });
        }

        let mapping = CategoricalEncoder::fit(listings.iter().map(|l| l.location.as_str()));
        let samples = encode(&listings, &mapping)?;
        info!(locations = mapping.len(), "Location mapping fitted");

        let split = train_test_split(&samples, self.config.test_fraction, self.config.seed)?;
        info!(
            train = split.train.len(),
            test = split.test.len(),
            seed = self.config.seed,
            "Dataset split"
        );

        let (train_x, train_y) = unzip(&split.train);
        let regression = LinearRegression::fit(&train_x, &train_y, self.config.l2)?;

        let (test_x, test_y) = unzip(&split.test);
        let report = EvaluationReport::evaluate(&test_y, &regression.predict_many(&test_x));
        info!(
            mae = report.mean_absolute_error,
            mse = report.mean_squared_error,
            r_squared = report.r_squared,
            "Model evaluated"
        );

        Ok(TrainingOutcome {
            model: TrainedModel::new(regression, split.train.len()),
            report,
            mapping,
            cleaning,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }
}

fn encode(listings: &[CleanListing], mapping: &CategoryMapping) -> TrainResult<Vec<Sample>> {
    listings
        .iter()
        .map(|l| {
            let location_code = mapping.encode(&l.location).map_err(|e| TrainError::Config {
                reason: e.to_string(),
            })?;
            Ok(Sample {
                features: FeatureVector::new(l.mileage, l.transmission.code(), location_code),
                price: l.price,
            })
        })
        .collect()
}

fn unzip(samples: &[Sample]) -> (Vec<FeatureVector>, Vec<f64>) {
    samples.iter().map(|s| (s.features, s.price)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ExclusionReason;

    fn raw(mileage: &str, price: &str, location: &str) -> RawListing {
        RawListing {
            name: "car".into(),
            transmission: "Manual".into(),
            mileage: mileage.into(),
            price: price.into(),
            location: location.into(),
        }
    }

    #[test]
    fn fully_excluded_dataset_is_fatal_with_counts() {
        let rows = vec![raw("10K km", "N/A", "Johor"), raw("N/A", "RM 5,000", "Johor")];

        let err = TrainingPipeline::new(TrainingConfig::default())
            .train(&rows)
            .unwrap_err();

        match err {
            TrainError::EmptyDataset { report } => {
                assert_eq!(report.total_rows, 2);
                assert_eq!(report.count(ExclusionReason::UnparsablePrice), 1);
                assert_eq!(report.count(ExclusionReason::UnparsableMileage), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = TrainingPipeline::new(TrainingConfig::default())
            .train(&[])
            .unwrap_err();
        assert!(matches!(err, TrainError::EmptyDataset { .. }));
    }

    #[test]
    fn single_clean_row_is_insufficient() {
        let err = TrainingPipeline::new(TrainingConfig::default())
            .train(&[raw("10K km", "RM 5,000", "Johor")])
            .unwrap_err();
        assert!(matches!(err, TrainError::InsufficientRows { needed: 2, got: 1 }));
    }

    #[test]
    fn invalid_fraction_is_rejected() {
        let err = TrainingPipeline::new(TrainingConfig::new().with_test_fraction(1.0))
            .train(&[])
            .unwrap_err();
        assert!(matches!(err, TrainError::Config { .. }));
    }

    #[test]
    fn mapping_covers_surviving_rows_only() {
        let rows = vec![
            raw("10K km", "RM 5,000", "Johor"),
            raw("20K km", "RM 4,000", "Perak"),
            raw("30K km", "RM 3,000", "Selangor"),
            raw("40K km", "N/A", "Sabah"),
        ];

        let outcome = TrainingPipeline::new(TrainingConfig::default())
            .train(&rows)
            .unwrap();

        assert_eq!(
            outcome.mapping.names().collect::<Vec<_>>(),
            vec!["Johor", "Perak", "Selangor"]
        );
        assert_eq!(outcome.train_rows + outcome.test_rows, 3);
        assert_eq!(outcome.test_rows, 1);
        assert_eq!(outcome.cleaning.count(ExclusionReason::UnparsablePrice), 1);
    }
}
