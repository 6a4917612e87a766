//! Common Types and Constants
//!
//! Shared data structures used by the rule engine, the classifier backend
//! and the dispatcher.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Upper bound of every risk score
pub const MAX_RISK_SCORE: f64 = 100.0;

/// Breakpoint below which a score is `Low`
pub const LOW_BREAKPOINT: f64 = 25.0;

/// Breakpoint below which a score is `Medium`
pub const MEDIUM_BREAKPOINT: f64 = 50.0;

/// Breakpoint below which a score is `High`
pub const HIGH_BREAKPOINT: f64 = 75.0;

/// Fixed confidence reported by the rule engine (percent)
pub const RULE_CONFIDENCE: f64 = 70.0;

/// Number of input features: score, attempts, time taken
pub const FEATURE_DIMENSION: usize = 3;

/// Number of ordinal risk classes
pub const N_CLASSES: usize = 4;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = ["score", "attempts", "time_taken"];

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Observation ====================

/// Signals observed for one quiz attempt.
///
/// `score` is a 0-100 percentage, `time_taken` is in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub score: f64,
    pub attempts: u32,
    pub time_taken: f64,
}

impl Observation {
    pub fn new(score: f64, attempts: u32, time_taken: f64) -> Self {
        Self {
            score,
            attempts,
            time_taken,
        }
    }

    pub fn to_features(&self) -> [f64; FEATURE_DIMENSION] {
        [self.score, self.attempts as f64, self.time_taken]
    }
}

// ==================== Risk Level ====================

/// Coarse risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; N_CLASSES] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Step function over the risk score. Each breakpoint is exclusive
    /// (`< 25` is Low, `25` is already Medium).
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score < LOW_BREAKPOINT {
            RiskLevel::Low
        } else if risk_score < MEDIUM_BREAKPOINT {
            RiskLevel::Medium
        } else if risk_score < HIGH_BREAKPOINT {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn to_index(&self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Assessment ====================

/// Which path produced an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    RuleBased,
    MachineLearning,
}

/// Result of scoring one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Risk score in [0, 100]
    pub risk_score: f64,
    /// Bucket of `risk_score`
    pub risk_level: RiskLevel,
    /// Confidence in [0, 100]
    pub confidence: f64,
    /// Per-level class probabilities, only set by the classifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<RiskLevel, f64>>,
    pub method: ScoringMethod,
}

impl RiskAssessment {
    pub fn is_valid(&self) -> bool {
        let in_range = |v: f64| v.is_finite() && (0.0..=MAX_RISK_SCORE).contains(&v);
        in_range(self.risk_score) && in_range(self.confidence)
    }
}

/// Clamp a raw point total into the valid risk range. NaN maps to 0.
pub fn clamp_risk(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_RISK_SCORE)
    }
}
