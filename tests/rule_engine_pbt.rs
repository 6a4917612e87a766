//! Property-Based Tests for the rule engine and risk levels
//!
//! Invariants:
//! - Bounds: risk_score and confidence stay in [0, 100] for any input
//! - Level consistency: risk_level == RiskLevel::from_score(risk_score)
//! - Monotonicity: a worse signal never lowers the score
//! - Purity: repeated calls are bit-identical

use proptest::prelude::*;

use neurolms_risk::{RiskLevel, RuleEngine, ScoringMethod};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_score() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0.0f64..=100.0f64),
        (-1e6f64..=1e6f64),
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
    ]
}

fn arb_time() -> impl Strategy<Value = f64> {
    prop_oneof![(0.0f64..=3600.0f64), (-1e6f64..=1e9f64), Just(f64::NAN)]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_score_and_confidence_bounded(score in arb_score(), attempts in any::<u32>(), time in arb_time()) {
        let result = RuleEngine::new().score(score, attempts, time);
        prop_assert!(result.is_valid());
        prop_assert!((0.0..=100.0).contains(&result.risk_score));
        prop_assert_eq!(result.method, ScoringMethod::RuleBased);
    }

    #[test]
    fn prop_level_matches_score(score in arb_score(), attempts in 0u32..10, time in arb_time()) {
        let result = RuleEngine::new().score(score, attempts, time);
        prop_assert_eq!(result.risk_level, RiskLevel::from_score(result.risk_score));
    }

    #[test]
    fn prop_pure_and_idempotent(score in arb_score(), attempts in any::<u32>(), time in arb_time()) {
        let engine = RuleEngine::new();
        let a = engine.score(score, attempts, time);
        let b = engine.score(score, attempts, time);
        prop_assert_eq!(a.risk_score.to_bits(), b.risk_score.to_bits());
        prop_assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        prop_assert_eq!(a.risk_level, b.risk_level);
    }

    #[test]
    fn prop_worse_signals_never_lower_risk(
        score in 0.0f64..=100.0,
        drop in 0.0f64..=100.0,
        attempts in 1u32..10,
        extra in 0u32..5,
        time in 0.0f64..=1000.0,
        slower in 0.0f64..=500.0,
    ) {
        let engine = RuleEngine::new();
        let base = engine.score(score, attempts, time).risk_score;
        prop_assert!(engine.score(score - drop, attempts, time).risk_score >= base);
        prop_assert!(engine.score(score, attempts + extra, time).risk_score >= base);
        prop_assert!(engine.score(score, attempts, time + slower).risk_score >= base);
    }

    #[test]
    fn prop_level_is_monotone(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(RiskLevel::from_score(lo) <= RiskLevel::from_score(hi));
    }
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn example_strong_learner_is_low() {
    let result = RuleEngine::new().score(95.0, 1, 45.0);
    assert_eq!(result.risk_score, 0.0);
    assert_eq!(result.risk_level, RiskLevel::Low);
}

#[test]
fn example_all_signals_is_critical() {
    let result = RuleEngine::new().score(40.0, 4, 350.0);
    assert_eq!(result.risk_score, 100.0);
    assert_eq!(result.risk_level, RiskLevel::Critical);
}

#[test]
fn example_fifty_is_high() {
    let result = RuleEngine::new().score(65.0, 2, 200.0);
    assert_eq!(result.risk_score, 50.0);
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn breakpoints_use_strict_less_than() {
    let cases = [
        (24.9, RiskLevel::Low),
        (25.0, RiskLevel::Medium),
        (49.9, RiskLevel::Medium),
        (50.0, RiskLevel::High),
        (74.9, RiskLevel::High),
        (75.0, RiskLevel::Critical),
    ];
    for (score, expected) in cases {
        assert_eq!(RiskLevel::from_score(score), expected, "score {}", score);
    }
}
