//! Synthetic training data.
//!
//! Samples are drawn from a seeded `ChaCha8Rng`, labeled with the graded
//! rule points plus Gaussian noise, and bucketed into the four risk classes.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::rules::rule_points;
use crate::types::{clamp_risk, RiskLevel, FEATURE_DIMENSION};

/// Mean extra attempts drawn per synthetic learner
const ATTEMPTS_LAMBDA: f64 = 1.5;

/// Standard deviation of the label noise (risk points)
const LABEL_NOISE_STD: f64 = 5.0;

const SCORE_RANGE: (f64, f64) = (0.0, 100.0);
const TIME_RANGE: (f64, f64) = (60.0, 660.0);

/// Labeled feature rows; `labels[i]` is a class index in `0..4`
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, features: Vec<f64>, label: usize) {
        self.features.push(features);
        self.labels.push(label);
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map(|f| f.len()).unwrap_or(FEATURE_DIMENSION)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Count of samples per class
    pub fn class_counts(&self, n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; n_classes];
        for &label in &self.labels {
            if label < n_classes {
                counts[label] += 1;
            }
        }
        counts
    }

    /// Shuffle and split into (train, test). `train_ratio` is clamped to [0, 1].
    pub fn split(&self, train_ratio: f64, rng: &mut ChaCha8Rng) -> (Dataset, Dataset) {
        let mut indices: Vec<usize> = (0..self.n_samples()).collect();
        indices.shuffle(rng);

        let n_train = (self.n_samples() as f64 * train_ratio.clamp(0.0, 1.0)).round() as usize;
        let (train_idx, test_idx) = indices.split_at(n_train);

        (self.subset(train_idx), self.subset(test_idx))
    }

    /// Bootstrap resample of the same size
    pub fn bootstrap_sample(&self, seed: u64) -> Dataset {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = self.n_samples();
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        self.subset(&indices)
    }

    fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Generate `n_samples` labeled rows from the given RNG.
pub fn generate_synthetic(n_samples: usize, rng: &mut ChaCha8Rng) -> Dataset {
    let mut dataset = Dataset::new();

    for _ in 0..n_samples {
        let score = rng.gen_range(SCORE_RANGE.0..SCORE_RANGE.1);
        let attempts = sample_poisson(rng, ATTEMPTS_LAMBDA) + 1;
        let time_taken = rng.gen_range(TIME_RANGE.0..TIME_RANGE.1);

        let noisy = rule_points(score, attempts, time_taken) + sample_normal(rng) * LABEL_NOISE_STD;
        let label = RiskLevel::from_score(clamp_risk(noisy)).to_index();

        dataset.add_sample(vec![score, attempts as f64, time_taken], label);
    }

    dataset
}

/// Standard normal draw using the Box-Muller transform
fn sample_normal(rng: &mut ChaCha8Rng) -> f64 {
    // gen::<f64>() is in [0, 1); keep u1 away from 0 for ln()
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Poisson draw using Knuth's multiplication method (fine for small lambda)
fn sample_poisson(rng: &mut ChaCha8Rng, lambda: f64) -> u32 {
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;

    loop {
        p *= rng.gen::<f64>();
        if p <= limit {
            return k;
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let data = generate_synthetic(500, &mut rng);
        assert_eq!(data.n_samples(), 500);
        assert_eq!(data.n_features(), FEATURE_DIMENSION);

        for (row, &label) in data.features.iter().zip(&data.labels) {
            assert!((0.0..100.0).contains(&row[0]));
            assert!(row[1] >= 1.0 && row[1].fract() == 0.0);
            assert!((60.0..660.0).contains(&row[2]));
            assert!(label < 4);
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = generate_synthetic(100, &mut ChaCha8Rng::seed_from_u64(42));
        let b = generate_synthetic(100, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_every_class_is_represented() {
        let data = generate_synthetic(1000, &mut ChaCha8Rng::seed_from_u64(42));
        let counts = data.class_counts(4);
        assert!(counts.iter().all(|&c| c > 0), "class counts {:?}", counts);
    }

    #[test]
    fn test_split_ratio() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let data = generate_synthetic(1000, &mut rng);
        let (train, test) = data.split(0.8, &mut rng);
        assert_eq!(train.n_samples(), 800);
        assert_eq!(test.n_samples(), 200);
    }

    #[test]
    fn test_poisson_mean_is_close_to_lambda() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 20_000;
        let total: u32 = (0..n).map(|_| sample_poisson(&mut rng, ATTEMPTS_LAMBDA)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - ATTEMPTS_LAMBDA).abs() < 0.1, "mean {}", mean);
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let n = 20_000;
        let draws: Vec<f64> = (0..n).map(|_| sample_normal(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }
}
