//! Single-row price prediction over loaded artifacts.
//!
//! Loading never fails as a whole: a missing or unreadable artifact
//! leaves the service up with that artifact marked unavailable, and each
//! request that needs it gets a specific error. Loaded artifacts sit
//! behind `Arc` and are never mutated, so clones share them freely.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifacts::{load_mapping, load_model, TrainedModel};
use crate::encoding::CategoryMapping;
use crate::error::PredictionError;
use crate::normalize::Transmission;
use crate::regression::FeatureVector;

/// A loaded artifact, or the reason it could not be loaded.
#[derive(Debug, Clone)]
pub enum ArtifactState<T> {
    Ready(Arc<T>),
    Unavailable(String),
}

impl<T> ArtifactState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ArtifactState::Ready(_))
    }

    pub fn status(&self) -> ArtifactStatus {
        match self {
            ArtifactState::Ready(_) => ArtifactStatus {
                ready: true,
                reason: None,
            },
            ArtifactState::Unavailable(reason) => ArtifactStatus {
                ready: false,
                reason: Some(reason.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub model: ArtifactStatus,
    pub location_mapping: ArtifactStatus,
}

/// What to do with a location name the mapping has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownLocationPolicy {
    /// Fail the request with [`PredictionError::UnknownLocation`]
    #[default]
    Reject,
    /// Substitute this caller-chosen code
    UseCode(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Kilometres, finite and non-negative
    pub mileage: f64,
    pub transmission: Transmission,
    pub location_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
}

/// Answers prediction requests from persisted artifacts.
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: ArtifactState<TrainedModel>,
    mapping: ArtifactState<CategoryMapping>,
    unknown_location: UnknownLocationPolicy,
}

impl PredictionService {
    /// Load both artifacts from `dir`, recording failures per artifact.
    pub fn load(dir: &Path) -> Self {
        let model = match load_model(dir) {
            Ok(model) => {
                info!(dir = %dir.display(), trained_rows = model.trained_rows, "Model loaded");
                ArtifactState::Ready(Arc::new(model))
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Model unavailable");
                ArtifactState::Unavailable(e.to_string())
            }
        };

        let mapping = match load_mapping(dir) {
            Ok(mapping) => {
                info!(dir = %dir.display(), locations = mapping.len(), "Location mapping loaded");
                ArtifactState::Ready(Arc::new(mapping))
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Location mapping unavailable");
                ArtifactState::Unavailable(e.to_string())
            }
        };

        Self {
            model,
            mapping,
            unknown_location: UnknownLocationPolicy::Reject,
        }
    }

    /// Build from in-memory artifacts.
    pub fn from_parts(model: TrainedModel, mapping: CategoryMapping) -> Self {
        Self {
            model: ArtifactState::Ready(Arc::new(model)),
            mapping: ArtifactState::Ready(Arc::new(mapping)),
            unknown_location: UnknownLocationPolicy::Reject,
        }
    }

    /// Set the unknown-location policy.
    ///
    /// A default code must exist in the loaded mapping.
    pub fn with_unknown_location_policy(
        mut self,
        policy: UnknownLocationPolicy,
    ) -> Result<Self, PredictionError> {
        if let UnknownLocationPolicy::UseCode(code) = policy {
            let mapping = self.mapping()?;
            if mapping.decode(code).is_none() {
                return Err(PredictionError::InvalidDefaultLocation { code });
            }
        }
        self.unknown_location = policy;
        Ok(self)
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_ready() && self.mapping.is_ready()
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            model: self.model.status(),
            location_mapping: self.mapping.status(),
        }
    }

    /// Known location names in code order, for a selector.
    pub fn location_names(&self) -> Result<Vec<String>, PredictionError> {
        Ok(self.mapping()?.names().map(str::to_string).collect())
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, PredictionError> {
        if !(request.mileage.is_finite() && request.mileage >= 0.0) {
            return Err(PredictionError::InvalidMileage {
                value: request.mileage,
            });
        }

        let model = self.model()?;
        let mapping = self.mapping()?;

        let location_code = match mapping.encode(&request.location_name) {
            Ok(code) => code,
            Err(unmapped) => match self.unknown_location {
                UnknownLocationPolicy::Reject => return Err(unmapped.into()),
                UnknownLocationPolicy::UseCode(code) => code,
            },
        };

        let features = FeatureVector::new(
            request.mileage,
            request.transmission.code(),
            location_code,
        );
        let predicted_price = model.predict(&features);

        if !(predicted_price.is_finite() && predicted_price > 0.0) {
            return Err(PredictionError::NonPositivePrediction {
                value: predicted_price,
            });
        }

        Ok(PredictionResponse { predicted_price })
    }

    fn model(&self) -> Result<&TrainedModel, PredictionError> {
        match &self.model {
            ArtifactState::Ready(model) => Ok(model),
            ArtifactState::Unavailable(reason) => Err(PredictionError::ModelUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    fn mapping(&self) -> Result<&CategoryMapping, PredictionError> {
        match &self.mapping {
            ArtifactState::Ready(mapping) => Ok(mapping),
            ArtifactState::Unavailable(reason) => Err(PredictionError::MappingUnavailable {
                reason: reason.clone(),
            }),
        }
    }
}
