//! Risk scoring entry point
//!
//! `RiskScorer` is built once by the host's composition root and shared
//! behind an `Arc`. Every call returns a valid assessment: the classifier is
//! tried when it is ready and the rule engine answers otherwise.

use std::path::PathBuf;

use serde::Serialize;

use crate::classifier::{BackendStatus, ClassifierBackend, TrainingSettings};
use crate::config::RiskConfig;
use crate::error::ModelResult;
use crate::persistence::{ModelStore, TrainingReport};
use crate::rules::RuleEngine;
use crate::types::{Observation, RiskAssessment, ScoringMethod, FEATURE_NAMES};

/// Which path answered a request
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Rule(RiskAssessment),
    Ml(RiskAssessment),
}

impl Prediction {
    pub fn assessment(&self) -> &RiskAssessment {
        match self {
            Prediction::Rule(a) | Prediction::Ml(a) => a,
        }
    }

    pub fn into_assessment(self) -> RiskAssessment {
        match self {
            Prediction::Rule(a) | Prediction::Ml(a) => a,
        }
    }

    pub fn method(&self) -> ScoringMethod {
        match self {
            Prediction::Rule(_) => ScoringMethod::RuleBased,
            Prediction::Ml(_) => ScoringMethod::MachineLearning,
        }
    }
}

/// Single fallback point. `attempt` is `None` when no classifier is
/// installed.
pub fn resolve(
    attempt: Option<ModelResult<RiskAssessment>>,
    rules: &RuleEngine,
    obs: &Observation,
) -> Prediction {
    match attempt {
        Some(Ok(assessment)) if assessment.is_valid() => Prediction::Ml(assessment),
        Some(Ok(assessment)) => {
            tracing::warn!(
                risk_score = assessment.risk_score,
                confidence = assessment.confidence,
                "classifier returned an out-of-range assessment, using rule engine"
            );
            Prediction::Rule(rules.score_observation(obs))
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "classifier prediction failed, using rule engine");
            Prediction::Rule(rules.score_observation(obs))
        }
        None => Prediction::Rule(rules.score_observation(obs)),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub is_trained: bool,
    pub status: BackendStatus,
    pub method: ScoringMethod,
    pub n_trees: usize,
    pub feature_names: Vec<String>,
    pub feature_importances: Vec<f64>,
    pub report: Option<TrainingReport>,
    pub classifier_path: PathBuf,
    pub scaler_path: PathBuf,
}

pub struct RiskScorer {
    rules: RuleEngine,
    backend: ClassifierBackend,
    settings: TrainingSettings,
}

impl RiskScorer {
    /// Untrained scorer; no I/O. Call `load_or_train` or use `bootstrap`.
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            rules: RuleEngine::new(),
            backend: ClassifierBackend::new(ModelStore::in_dir(&config.model_dir)),
            settings: TrainingSettings::from(config),
        }
    }

    pub fn with_store(store: ModelStore, settings: TrainingSettings) -> Self {
        Self {
            rules: RuleEngine::new(),
            backend: ClassifierBackend::new(store),
            settings,
        }
    }

    /// Startup composition: load persisted state, otherwise train once when
    /// `train_on_startup` is set. Failures are logged; the scorer still
    /// answers with the rule engine.
    pub fn bootstrap(config: &RiskConfig) -> Self {
        let scorer = Self::new(config);
        scorer.load_or_train(config.train_on_startup);
        scorer
    }

    pub fn load_or_train(&self, train_if_missing: bool) -> BackendStatus {
        match self.backend.load() {
            Ok(true) => return BackendStatus::Ready,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to load persisted risk classifier");
            }
        }

        if train_if_missing {
            if let Err(err) = self.retrain() {
                tracing::error!(error = %err, "risk classifier training failed, rule engine only");
            }
        }

        self.backend.status()
    }

    /// Train a fresh classifier and replace the current one on success.
    /// Callers must not run two retrains at once.
    pub fn retrain(&self) -> ModelResult<TrainingReport> {
        self.backend.train(&self.settings)
    }

    pub fn predict_risk(&self, score: f64, attempts: u32, time_taken: f64) -> RiskAssessment {
        self.assess(&Observation::new(score, attempts, time_taken))
    }

    pub fn assess(&self, obs: &Observation) -> RiskAssessment {
        self.dispatch(obs).into_assessment()
    }

    pub fn dispatch(&self, obs: &Observation) -> Prediction {
        let attempt = self.backend.current().map(|model| model.predict(obs));
        resolve(attempt, &self.rules, obs)
    }

    /// Legacy entry point returning only the score
    pub fn calculate_risk(&self, score: f64, attempts: u32, time_taken: f64) -> f64 {
        self.predict_risk(score, attempts, time_taken).risk_score
    }

    pub fn status(&self) -> BackendStatus {
        self.backend.status()
    }

    pub fn backend(&self) -> &ClassifierBackend {
        &self.backend
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn model_info(&self) -> ModelInfo {
        let model = self.backend.current();
        let store = self.backend.store();

        ModelInfo {
            is_trained: model.is_some(),
            status: self.backend.status(),
            method: if model.is_some() {
                ScoringMethod::MachineLearning
            } else {
                ScoringMethod::RuleBased
            },
            n_trees: model.as_ref().map(|m| m.forest.n_trees()).unwrap_or(0),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            feature_importances: model
                .as_ref()
                .map(|m| m.forest.feature_importances().to_vec())
                .unwrap_or_default(),
            report: model.map(|m| m.report.clone()),
            classifier_path: store.classifier_path().to_path_buf(),
            scaler_path: store.scaler_path().to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::types::{RiskLevel, RULE_CONFIDENCE};

    #[test]
    fn test_resolve_without_classifier_uses_rules() {
        let obs = Observation::new(65.0, 2, 200.0);
        let prediction = resolve(None, &RuleEngine::new(), &obs);
        assert_eq!(prediction.method(), ScoringMethod::RuleBased);
        assert_eq!(prediction.assessment().risk_score, 50.0);
    }

    #[test]
    fn test_resolve_error_falls_back() {
        let obs = Observation::new(40.0, 4, 350.0);
        let prediction = resolve(
            Some(Err(ModelError::MalformedFeatures("bad".into()))),
            &RuleEngine::new(),
            &obs,
        );
        assert_eq!(
            prediction.into_assessment(),
            RuleEngine::new().score(40.0, 4, 350.0)
        );
    }

    #[test]
    fn test_resolve_rejects_invalid_ml_output() {
        let obs = Observation::new(95.0, 1, 45.0);
        let broken = RiskAssessment {
            risk_score: f64::NAN,
            risk_level: RiskLevel::Low,
            confidence: 50.0,
            probabilities: None,
            method: ScoringMethod::MachineLearning,
        };
        let prediction = resolve(Some(Ok(broken)), &RuleEngine::new(), &obs);
        assert_eq!(prediction.method(), ScoringMethod::RuleBased);
        assert_eq!(prediction.assessment().confidence, RULE_CONFIDENCE);
    }

    #[test]
    fn test_untrained_scorer_is_rule_based() {
        let dir = tempfile::tempdir().unwrap();
        let config = RiskConfig {
            model_dir: dir.path().to_path_buf(),
            train_on_startup: false,
            ..Default::default()
        };
        let scorer = RiskScorer::bootstrap(&config);

        assert_eq!(scorer.status(), BackendStatus::Untrained);
        assert_eq!(scorer.calculate_risk(40.0, 4, 350.0), 100.0);

        let info = scorer.model_info();
        assert!(!info.is_trained);
        assert_eq!(info.method, ScoringMethod::RuleBased);
        assert_eq!(info.n_trees, 0);
        assert!(info.report.is_none());
    }
}
