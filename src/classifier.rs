//! Classifier backend
//!
//! Holds an optional trained model behind `RwLock<Option<Arc<_>>>`.
//! `None` is the Untrained state, `Some` is Ready. Training builds and
//! persists a complete replacement before swapping the pointer, so a
//! prediction in flight keeps using whichever model it cloned.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::dataset::{generate_synthetic, Dataset};
use crate::error::{ModelError, ModelResult};
use crate::forest::{ForestConfig, RandomForest};
use crate::persistence::{ModelStore, PersistedClassifier, TrainingReport};
use crate::scaler::StandardScaler;
use crate::types::{
    clamp_risk, Observation, RiskAssessment, RiskLevel, ScoringMethod, FEATURE_DIMENSION,
    MAX_RISK_SCORE, N_CLASSES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Untrained,
    Ready,
}

#[derive(Debug, Clone)]
pub struct TrainingSettings {
    pub seed: u64,
    pub n_samples: usize,
    pub train_ratio: f64,
    pub forest: ForestConfig,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self::from(&RiskConfig::default())
    }
}

impl From<&RiskConfig> for TrainingSettings {
    fn from(config: &RiskConfig) -> Self {
        Self {
            seed: config.seed,
            n_samples: config.n_samples,
            train_ratio: config.train_ratio,
            forest: config.forest.clone(),
        }
    }
}

/// Fitted scaler, forest and the report of the run that produced them
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub report: TrainingReport,
}

impl TrainedModel {
    /// Generate synthetic data, split, scale and fit. No I/O.
    pub fn fit(settings: &TrainingSettings) -> ModelResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let data = generate_synthetic(settings.n_samples, &mut rng);
        let (train, test) = data.split(settings.train_ratio, &mut rng);

        if train.is_empty() {
            return Err(ModelError::DegenerateDataset(format!(
                "{} samples at ratio {} leave no training rows",
                settings.n_samples, settings.train_ratio
            )));
        }

        let scaler = StandardScaler::fit(&train.features)?;
        let scaled_train = Dataset {
            features: scaler.transform_all(&train.features)?,
            labels: train.labels,
        };
        let scaled_test = Dataset {
            features: scaler.transform_all(&test.features)?,
            labels: test.labels,
        };

        let mut forest = RandomForest::new(settings.forest.clone(), N_CLASSES);
        forest.fit(&scaled_train)?;

        let report = TrainingReport {
            train_accuracy: forest.accuracy(&scaled_train),
            test_accuracy: forest.accuracy(&scaled_test),
            n_train: scaled_train.n_samples(),
            n_test: scaled_test.n_samples(),
            seed: settings.seed,
            trained_at: chrono::Utc::now().to_rfc3339(),
        };

        Ok(Self {
            forest,
            scaler,
            report,
        })
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.scaler.validate()?;
        if self.forest.n_classes() != N_CLASSES {
            return Err(ModelError::InvalidModel(format!(
                "forest has {} classes, expected {}",
                self.forest.n_classes(),
                N_CLASSES
            )));
        }
        if self.forest.n_features() != FEATURE_DIMENSION || self.scaler.dim() != FEATURE_DIMENSION {
            return Err(ModelError::InvalidModel(format!(
                "forest/scaler dimensions {}/{} do not match {} features",
                self.forest.n_features(),
                self.scaler.dim(),
                FEATURE_DIMENSION
            )));
        }
        Ok(())
    }

    pub fn predict(&self, obs: &Observation) -> ModelResult<RiskAssessment> {
        let scaled = self.scaler.transform(&obs.to_features())?;
        let (class, probs) = self.forest.predict(&scaled)?;

        if probs.len() != N_CLASSES {
            return Err(ModelError::InvalidModel(format!(
                "expected {} class probabilities, got {}",
                N_CLASSES,
                probs.len()
            )));
        }
        let risk_level = RiskLevel::from_index(class)
            .ok_or_else(|| ModelError::InvalidModel(format!("class index {} out of range", class)))?;

        let max_prob = probs.iter().copied().fold(0.0, f64::max);
        let probabilities: BTreeMap<RiskLevel, f64> =
            RiskLevel::ALL.into_iter().zip(probs).collect();

        Ok(RiskAssessment {
            risk_score: clamp_risk(class as f64 / (N_CLASSES - 1) as f64 * MAX_RISK_SCORE),
            risk_level,
            confidence: clamp_risk(max_prob * 100.0),
            probabilities: Some(probabilities),
            method: ScoringMethod::MachineLearning,
        })
    }
}

pub struct ClassifierBackend {
    store: ModelStore,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl ClassifierBackend {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            model: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn status(&self) -> BackendStatus {
        if self.model.read().is_some() {
            BackendStatus::Ready
        } else {
            BackendStatus::Untrained
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == BackendStatus::Ready
    }

    /// Snapshot of the installed model
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    /// Swap in a complete model. The previous one stays alive for readers
    /// that already hold it.
    pub fn install(&self, model: TrainedModel) {
        *self.model.write() = Some(Arc::new(model));
    }

    /// Load persisted state. Returns whether a model was installed; missing
    /// files are `Ok(false)`, unreadable ones are an error and leave the
    /// current state alone.
    pub fn load(&self) -> ModelResult<bool> {
        let Some((classifier, scaler)) = self.store.load()? else {
            tracing::info!(
                path = %self.store.classifier_path().display(),
                "no persisted risk classifier found"
            );
            return Ok(false);
        };

        let model = TrainedModel {
            forest: classifier.forest,
            scaler,
            report: classifier.report,
        };
        model.validate()?;

        tracing::info!(
            test_accuracy = model.report.test_accuracy,
            trained_at = %model.report.trained_at,
            "loaded persisted risk classifier"
        );
        self.install(model);
        Ok(true)
    }

    /// Fit, persist, then swap. Any failure leaves the installed model as it was.
    pub fn train(&self, settings: &TrainingSettings) -> ModelResult<TrainingReport> {
        let started = std::time::Instant::now();
        let model = TrainedModel::fit(settings)?;

        tracing::info!(
            train_accuracy = model.report.train_accuracy,
            test_accuracy = model.report.test_accuracy,
            n_train = model.report.n_train,
            n_test = model.report.n_test,
            seed = settings.seed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "risk classifier trained"
        );

        let persisted = PersistedClassifier {
            version: PersistedClassifier::VERSION,
            forest: model.forest.clone(),
            report: model.report.clone(),
        };
        self.store.save(&persisted, &model.scaler)?;

        let report = model.report.clone();
        self.install(model);
        Ok(report)
    }

    pub fn predict(&self, obs: &Observation) -> ModelResult<RiskAssessment> {
        let model = self.current().ok_or(ModelError::NotTrained)?;
        model.predict(obs)
    }
}
