//! On-disk storage for the trained classifier and its feature scaler.
//!
//! Each blob is JSON written to a sibling temp file and renamed into place,
//! so readers only ever see a complete file. Both blobs carry the run id of
//! the training run that produced them; a pair with different ids is
//! rejected on load.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::forest::RandomForest;
use crate::scaler::StandardScaler;

pub const CLASSIFIER_FILE: &str = "risk_classifier.json";
pub const SCALER_FILE: &str = "risk_scaler.json";

/// Accuracy and provenance recorded for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub seed: u64,
    pub trained_at: String,
}

impl TrainingReport {
    /// Identifies the run that wrote a classifier/scaler pair
    pub fn run_id(&self) -> String {
        format!("{}@{}", self.seed, self.trained_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedClassifier {
    pub version: u32,
    pub forest: RandomForest,
    pub report: TrainingReport,
}

impl PersistedClassifier {
    pub const VERSION: u32 = 2;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedScaler {
    run_id: String,
    scaler: StandardScaler,
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    classifier_path: PathBuf,
    scaler_path: PathBuf,
}

impl ModelStore {
    pub fn new(classifier_path: impl Into<PathBuf>, scaler_path: impl Into<PathBuf>) -> Self {
        Self {
            classifier_path: classifier_path.into(),
            scaler_path: scaler_path.into(),
        }
    }

    /// Both blobs under one directory with the default file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(CLASSIFIER_FILE), dir.join(SCALER_FILE))
    }

    pub fn classifier_path(&self) -> &Path {
        &self.classifier_path
    }

    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }

    /// `Ok(None)` when either blob is absent; an error when one exists but
    /// cannot be read or parsed.
    pub fn load(&self) -> ModelResult<Option<(PersistedClassifier, StandardScaler)>> {
        let Some(classifier) = read_json::<PersistedClassifier>(&self.classifier_path)? else {
            return Ok(None);
        };
        let Some(persisted_scaler) = read_json::<PersistedScaler>(&self.scaler_path)? else {
            return Ok(None);
        };

        if classifier.version != PersistedClassifier::VERSION {
            return Err(ModelError::InvalidModel(format!(
                "unsupported classifier version {}",
                classifier.version
            )));
        }
        let run_id = classifier.report.run_id();
        if persisted_scaler.run_id != run_id {
            return Err(ModelError::InvalidModel(format!(
                "scaler belongs to run {}, classifier to run {}",
                persisted_scaler.run_id, run_id
            )));
        }

        let scaler = persisted_scaler.scaler;
        scaler.validate()?;
        if scaler.dim() != classifier.forest.n_features() {
            return Err(ModelError::InvalidScaler(format!(
                "scaler has {} features, classifier expects {}",
                scaler.dim(),
                classifier.forest.n_features()
            )));
        }

        Ok(Some((classifier, scaler)))
    }

    /// Scaler first, classifier last. A failure between the two writes
    /// leaves ids that disagree, which `load` reports as `InvalidModel`.
    pub fn save(&self, classifier: &PersistedClassifier, scaler: &StandardScaler) -> ModelResult<()> {
        let persisted_scaler = PersistedScaler {
            run_id: classifier.report.run_id(),
            scaler: scaler.clone(),
        };
        write_json(&self.scaler_path, &persisted_scaler)?;
        write_json(&self.classifier_path, classifier)?;
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ModelResult<Option<T>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ModelError::io(path, err)),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ModelResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ModelError::io(parent, e))?;
    }

    let raw = serde_json::to_vec(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, raw).map_err(|e| ModelError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| ModelError::io(path, e))?;
    Ok(())
}
