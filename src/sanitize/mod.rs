//! Data Sanitization
//!
//! Numerical checks applied on the classifier path.
//!
//! Functions:
//! - Feature vector validation
//! - Probability vector normalization

use crate::error::{ModelError, ModelResult};
use crate::types::EPSILON;

/// Whether the slice contains NaN or Inf
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Reject feature vectors the scaler and forest cannot consume
pub fn validate_feature_vector(x: &[f64], expected_dim: usize) -> ModelResult<()> {
    if x.len() != expected_dim {
        return Err(ModelError::MalformedFeatures(format!(
            "expected {} features, got {}",
            expected_dim,
            x.len()
        )));
    }
    if has_invalid_values(x) {
        return Err(ModelError::MalformedFeatures(format!(
            "non-finite feature value in {:?}",
            x
        )));
    }
    Ok(())
}

/// Normalize a probability vector in place so it sums to 1.
///
/// Invalid or negative entries become 0. A vector with no mass is left as
/// all zeros and reported as `false`.
pub fn normalize_probabilities(p: &mut [f64]) -> bool {
    for val in p.iter_mut() {
        if !val.is_finite() || *val < 0.0 {
            *val = 0.0;
        }
    }

    let total: f64 = p.iter().sum();
    if total <= EPSILON {
        return false;
    }

    for val in p.iter_mut() {
        *val /= total;
    }
    true
}
