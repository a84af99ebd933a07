//! Used-Car Price Model
//!
//! Turns the raw listing CSV into a price regression model and serves
//! single-row predictions from the persisted artifacts.
//!
//! # Data flow
//!
//! ```text
//! RawListing ──clean──► CleanListing ──encode──► FeatureVector
//!                                                     │
//!                         split (seed 42) ◄───────────┘
//!                              │
//!                 fit ──► TrainedModel + CategoryMapping ──persist──► artifacts/
//!                                                                        │
//!                                         PredictionService ◄──load──────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use price_model::{PredictionRequest, PredictionService, Transmission, TrainingConfig, TrainingPipeline};
//!
//! let outcome = TrainingPipeline::new(TrainingConfig::default())
//!     .train_from_csv("carlist_data.csv".as_ref())?;
//! println!("{}", outcome.report);
//! outcome.persist("artifacts".as_ref())?;
//!
//! let service = PredictionService::load("artifacts".as_ref());
//! let price = service.predict(&PredictionRequest {
//!     mileage: 45_000.0,
//!     transmission: Transmission::Automatic,
//!     location_name: "Selangor".into(),
//! })?;
//! ```

pub mod artifacts;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod explore;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod prediction;
pub mod regression;
pub mod split;

pub use artifacts::{load_mapping, load_model, save_mapping, save_model, TrainedModel};
pub use dataset::{clean, clean_dataset, clean_row, CleanListing, CleaningReport, ExclusionReason};
pub use encoding::{CategoricalEncoder, CategoryMapping};
pub use error::{
    ArtifactError, ArtifactResult, PredictionError, TrainError, TrainResult, UnmappedCategory,
};
pub use explore::{explore, ExploreReport};
pub use metrics::EvaluationReport;
pub use normalize::{parse_mileage, parse_price, ParseTransmissionError, Transmission};
pub use pipeline::{PersistedArtifacts, TrainingConfig, TrainingOutcome, TrainingPipeline};
pub use prediction::{
    PredictionRequest, PredictionResponse, PredictionService, ServiceStatus,
    UnknownLocationPolicy,
};
pub use regression::{FeatureVector, LinearRegression, FEATURE_NAMES};
pub use split::{train_test_split, TrainTestSplit};
