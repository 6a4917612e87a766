//! # neurolms-risk - learner risk scoring
//!
//! Scores how likely a learner is to struggle from three quiz signals:
//! percentage score (0-100), attempt count and time taken in seconds.
//!
//! - **Rule engine** - fixed point thresholds, always available
//! - **Classifier backend** - random forest trained on synthetic data,
//!   persisted to disk and used when ready
//! - **Dispatcher** - tries the classifier, falls back to the rules on any
//!   failure, never returns an error
//!
//! ## Module structure
//!
//! - [`types`] - observations, assessments, risk levels, constants
//! - [`rules`] - rule-based scorer
//! - [`dataset`] - synthetic data generation and splitting
//! - [`scaler`] - feature standardization
//! - [`forest`] - decision tree and random forest
//! - [`persistence`] - model storage
//! - [`classifier`] - classifier backend state
//! - [`scorer`] - public entry point
//! - [`dashboard`] - per-trainer risk aggregation
//! - [`config`] / [`logging`] - environment configuration and tracing setup
//!
//! ## Example
//!
//! ```rust
//! use neurolms_risk::{RiskLevel, RuleEngine};
//!
//! let result = RuleEngine::new().score(65.0, 2, 200.0);
//! assert_eq!(result.risk_score, 50.0);
//! assert_eq!(result.risk_level, RiskLevel::High);
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod logging;
pub mod persistence;
pub mod rules;
pub mod sanitize;
pub mod scaler;
pub mod scorer;
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use types::*;

pub use classifier::{BackendStatus, ClassifierBackend, TrainedModel, TrainingSettings};
pub use config::RiskConfig;
pub use dashboard::{build_risk_dashboard, TrainerRiskSummary};
pub use error::{ModelError, ModelResult};
pub use persistence::{ModelStore, TrainingReport};
pub use rules::RuleEngine;
pub use scorer::{ModelInfo, Prediction, RiskScorer};
