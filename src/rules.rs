//! Rule-based risk scoring.
//!
//! Three independent point contributions, summed and clamped:
//!
//! | signal       | +40 / +30       | +20 / +15        |
//! |--------------|-----------------|------------------|
//! | score        | `< 50`  (+40)   | `< 70`  (+20)    |
//! | attempts     | `> 3`   (+30)   | `> 1`   (+15)    |
//! | time_taken   | `> 300` (+30)   | `> 180` (+15)    |

use crate::types::{clamp_risk, Observation, RiskAssessment, RiskLevel, ScoringMethod, RULE_CONFIDENCE};

/// Deterministic threshold scorer. Needs no setup and has no failure modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, score: f64, attempts: u32, time_taken: f64) -> RiskAssessment {
        let risk_score = clamp_risk(rule_points(score, attempts, time_taken));

        RiskAssessment {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            confidence: RULE_CONFIDENCE,
            probabilities: None,
            method: ScoringMethod::RuleBased,
        }
    }

    pub fn score_observation(&self, obs: &Observation) -> RiskAssessment {
        self.score(obs.score, obs.attempts, obs.time_taken)
    }
}

/// Raw, unclamped point total. Also used to label synthetic training data.
pub fn rule_points(score: f64, attempts: u32, time_taken: f64) -> f64 {
    let mut points = 0.0;

    if score < 50.0 {
        points += 40.0;
    } else if score < 70.0 {
        points += 20.0;
    }

    if attempts > 3 {
        points += 30.0;
    } else if attempts > 1 {
        points += 15.0;
    }

    if time_taken > 300.0 {
        points += 30.0;
    } else if time_taken > 180.0 {
        points += 15.0;
    }

    points
}
