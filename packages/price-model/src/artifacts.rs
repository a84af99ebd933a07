//! Persisted serving artifacts: the fitted model and the location mapping.
//!
//! Both are JSON files in one artifacts directory. Writes go to a sibling
//! temp file that is renamed over the target, so a reader sees either the
//! previous artifact or the new one, never a partial file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::encoding::CategoryMapping;
use crate::error::{ArtifactError, ArtifactResult};
use crate::normalize::Transmission;
use crate::regression::{FeatureVector, LinearRegression, FEATURE_COUNT, FEATURE_NAMES};

pub const MODEL_FILE: &str = "model.json";
pub const LOCATION_MAPPING_FILE: &str = "location_mapping.json";

/// Bumped when the persisted model layout changes.
pub const MODEL_SCHEMA_VERSION: u32 = 1;

/// The serving model plus the conventions it was trained under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub transmission_codes: BTreeMap<String, u32>,
    pub regression: LinearRegression,
    pub trained_rows: usize,
}

impl TrainedModel {
    pub fn new(regression: LinearRegression, trained_rows: usize) -> Self {
        Self {
            schema_version: MODEL_SCHEMA_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            transmission_codes: transmission_codes(),
            regression,
            trained_rows,
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.regression.predict(features)
    }

    pub fn to_bytes(&self) -> ArtifactResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode and check the layout against this build's conventions.
    pub fn from_bytes(bytes: &[u8]) -> ArtifactResult<Self> {
        let model: TrainedModel = serde_json::from_slice(bytes)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> ArtifactResult<()> {
        if self.schema_version != MODEL_SCHEMA_VERSION {
            return Err(ArtifactError::SchemaMismatch {
                reason: format!(
                    "schema version {} (expected {})",
                    self.schema_version, MODEL_SCHEMA_VERSION
                ),
            });
        }
        if self.feature_names != FEATURE_NAMES {
            return Err(ArtifactError::SchemaMismatch {
                reason: format!(
                    "feature order {:?} (expected {:?})",
                    self.feature_names, FEATURE_NAMES
                ),
            });
        }
        if self.transmission_codes != transmission_codes() {
            return Err(ArtifactError::SchemaMismatch {
                reason: format!(
                    "transmission codes {:?} (expected {:?})",
                    self.transmission_codes,
                    transmission_codes()
                ),
            });
        }
        if self.regression.coefficients.len() != FEATURE_COUNT {
            return Err(ArtifactError::Corrupt {
                reason: format!(
                    "{} coefficients for {} features",
                    self.regression.coefficients.len(),
                    FEATURE_COUNT
                ),
            });
        }
        let finite = self.regression.intercept.is_finite()
            && self.regression.coefficients.iter().all(|c| c.is_finite());
        if !finite {
            return Err(ArtifactError::Corrupt {
                reason: "non-finite model parameter".to_string(),
            });
        }
        Ok(())
    }
}

/// The fixed `Manual = 0`, `Automatic = 1` convention as persisted.
pub fn transmission_codes() -> BTreeMap<String, u32> {
    Transmission::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), t.code()))
        .collect()
}

pub fn model_path(dir: &Path) -> PathBuf {
    dir.join(MODEL_FILE)
}

pub fn mapping_path(dir: &Path) -> PathBuf {
    dir.join(LOCATION_MAPPING_FILE)
}

pub fn save_model(dir: &Path, model: &TrainedModel) -> ArtifactResult<PathBuf> {
    let path = model_path(dir);
    write_atomic(&path, &model.to_bytes()?)?;
    Ok(path)
}

pub fn load_model(dir: &Path) -> ArtifactResult<TrainedModel> {
    TrainedModel::from_bytes(&read_artifact(&model_path(dir))?)
}

pub fn save_mapping(dir: &Path, mapping: &CategoryMapping) -> ArtifactResult<PathBuf> {
    let path = mapping_path(dir);
    write_atomic(&path, &mapping.to_bytes()?)?;
    Ok(path)
}

pub fn load_mapping(dir: &Path) -> ArtifactResult<CategoryMapping> {
    CategoryMapping::from_bytes(&read_artifact(&mapping_path(dir))?)
}

/// Write `bytes` to a temp file beside `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ArtifactResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
    Ok(())
}

fn read_artifact(path: &Path) -> ArtifactResult<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io(e),
    })
}
