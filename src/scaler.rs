use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::sanitize::validate_feature_vector;
use crate::types::EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStat {
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for FeatureStat {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

/// Zero-mean, unit-variance feature standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub stats: Vec<FeatureStat>,
}

impl StandardScaler {
    /// Fit on the training rows only. A constant column keeps `std_dev = 1`
    /// so it is centered but not blown up.
    pub fn fit(rows: &[Vec<f64>]) -> ModelResult<Self> {
        let first = rows
            .first()
            .ok_or_else(|| ModelError::DegenerateDataset("cannot fit scaler on zero rows".into()))?;
        let dim = first.len();
        let n = rows.len() as f64;

        let mut sums = vec![0.0; dim];
        for row in rows {
            validate_feature_vector(row, dim)?;
            for (s, v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        let means: Vec<f64> = sums.iter().map(|s| s / n).collect();

        let mut sq = vec![0.0; dim];
        for row in rows {
            for ((acc, v), m) in sq.iter_mut().zip(row).zip(&means) {
                *acc += (v - m).powi(2);
            }
        }

        let stats = means
            .into_iter()
            .zip(sq)
            .map(|(mean, sq)| {
                let std_dev = (sq / n).sqrt();
                FeatureStat {
                    mean,
                    std_dev: if std_dev > EPSILON { std_dev } else { 1.0 },
                }
            })
            .collect();

        Ok(Self { stats })
    }

    pub fn dim(&self) -> usize {
        self.stats.len()
    }

    /// Persisted scalers are untrusted input; check them before use.
    pub fn validate(&self) -> ModelResult<()> {
        if self.stats.is_empty() {
            return Err(ModelError::InvalidScaler("no feature statistics".into()));
        }
        for (i, stat) in self.stats.iter().enumerate() {
            if !stat.mean.is_finite() || !stat.std_dev.is_finite() || stat.std_dev <= 0.0 {
                return Err(ModelError::InvalidScaler(format!(
                    "feature {} has mean={} std_dev={}",
                    i, stat.mean, stat.std_dev
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, x: &[f64]) -> ModelResult<Vec<f64>> {
        self.validate()?;
        validate_feature_vector(x, self.dim())?;

        Ok(x.iter()
            .zip(&self.stats)
            .map(|(v, stat)| (v - stat.mean) / stat.std_dev)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> ModelResult<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<f64>> {
        vec![
            vec![10.0, 1.0, 100.0],
            vec![20.0, 1.0, 200.0],
            vec![30.0, 1.0, 300.0],
        ]
    }

    #[test]
    fn test_fit_centers_and_scales() {
        let scaler = StandardScaler::fit(&rows()).unwrap();
        let transformed = scaler.transform_all(&rows()).unwrap();

        for col in [0, 2] {
            let mean: f64 = transformed.iter().map(|r| r[col]).sum::<f64>() / 3.0;
            let var: f64 = transformed.iter().map(|r| r[col].powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let scaler = StandardScaler::fit(&rows()).unwrap();
        assert_eq!(scaler.stats[1].std_dev, 1.0);
        assert_eq!(scaler.transform(&[20.0, 1.0, 200.0]).unwrap()[1], 0.0);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(ModelError::DegenerateDataset(_))
        ));
    }

    #[test]
    fn test_corrupt_scaler_is_rejected_at_transform() {
        let mut scaler = StandardScaler::fit(&rows()).unwrap();
        scaler.stats[0].std_dev = 0.0;
        assert!(matches!(
            scaler.transform(&[1.0, 1.0, 1.0]),
            Err(ModelError::InvalidScaler(_))
        ));

        scaler.stats.truncate(2);
        scaler.stats[0].std_dev = 1.0;
        assert!(matches!(
            scaler.transform(&[1.0, 1.0, 1.0]),
            Err(ModelError::MalformedFeatures(_))
        ));
    }
}
