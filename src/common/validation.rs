//! Validation utilities for sketch constructor parameter bounds checking

use crate::common::{Result, SketchError};

/// Validate that epsilon (the relative-rank-error target) is in `(0, 1]`
pub fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !(epsilon > 0.0 && epsilon <= 1.0) {
        return Err(SketchError::InvalidParameter {
            param: "epsilon".to_string(),
            value: epsilon.to_string(),
            constraint: "must be in range (0, 1]".to_string(),
        });
    }
    Ok(())
}

/// Validate that delta (the failure probability) is in `(0, 0.5]`
pub fn validate_delta(delta: f64) -> Result<()> {
    if !(delta > 0.0 && delta <= 0.5) {
        return Err(SketchError::InvalidParameter {
            param: "delta".to_string(),
            value: delta.to_string(),
            constraint: "must be in range (0, 0.5]".to_string(),
        });
    }
    Ok(())
}

/// Validate that J (the importance weight) is non-negative
pub fn validate_j(j: f64) -> Result<()> {
    if j < 0.0 {
        return Err(SketchError::InvalidParameter {
            param: "j".to_string(),
            value: j.to_string(),
            constraint: "must be non-negative".to_string(),
        });
    }
    Ok(())
}

/// Validate that every important quantile lies in `[0, 1]`
pub fn validate_important_quantiles(quantiles: &[f64]) -> Result<()> {
    for &q in quantiles {
        if !(0.0..=1.0).contains(&q) {
            return Err(SketchError::InvalidParameter {
                param: "important_quantiles".to_string(),
                value: q.to_string(),
                constraint: "each quantile must be in range [0, 1]".to_string(),
            });
        }
    }
    Ok(())
}

/// Validate that a non-zero importance weight is paired with at least one important quantile
pub fn validate_j_requires_quantiles(j: f64, quantiles: &[f64]) -> Result<()> {
    if j != 0.0 && quantiles.is_empty() {
        return Err(SketchError::InvalidParameter {
            param: "j".to_string(),
            value: j.to_string(),
            constraint: "with no important quantiles, j must equal 0".to_string(),
        });
    }
    Ok(())
}

/// Validate a query quantile `q` is in `[0, 1]`
pub fn validate_query_quantile(q: f64) -> Result<()> {
    if q.is_nan() || !(0.0..=1.0).contains(&q) {
        return Err(SketchError::InvalidParameter {
            param: "q".to_string(),
            value: q.to_string(),
            constraint: "must be in range [0, 1]".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_accepts_half_open_interval() {
        assert!(validate_epsilon(0.001).is_ok());
        assert!(validate_epsilon(1.0).is_ok());
        assert!(validate_epsilon(0.0).is_err());
        assert!(validate_epsilon(1.1).is_err());
    }

    #[test]
    fn delta_accepts_half_open_interval() {
        assert!(validate_delta(0.01).is_ok());
        assert!(validate_delta(0.5).is_ok());
        assert!(validate_delta(0.0).is_err());
        assert!(validate_delta(0.51).is_err());
    }

    #[test]
    fn j_must_be_non_negative() {
        assert!(validate_j(0.0).is_ok());
        assert!(validate_j(2.5).is_ok());
        assert!(validate_j(-0.1).is_err());
    }

    #[test]
    fn quantiles_must_be_in_unit_interval() {
        assert!(validate_important_quantiles(&[0.0, 0.5, 1.0]).is_ok());
        assert!(validate_important_quantiles(&[1.5]).is_err());
        assert!(validate_important_quantiles(&[-0.1]).is_err());
    }

    #[test]
    fn nonzero_j_requires_quantiles() {
        assert!(validate_j_requires_quantiles(0.0, &[]).is_ok());
        assert!(validate_j_requires_quantiles(0.5, &[]).is_err());
        assert!(validate_j_requires_quantiles(0.5, &[0.0]).is_ok());
    }

    #[test]
    fn query_quantile_rejects_out_of_range_and_nan() {
        assert!(validate_query_quantile(0.0).is_ok());
        assert!(validate_query_quantile(1.0).is_ok());
        assert!(validate_query_quantile(-0.01).is_err());
        assert!(validate_query_quantile(1.01).is_err());
        assert!(validate_query_quantile(f64::NAN).is_err());
    }
}
