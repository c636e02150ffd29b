// src/error.rs
use thiserror::Error;

/// Error types for the heston-variance library
#[derive(Debug, Clone, Error)]
pub enum SdeError {
    /// Invalid parameter values
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Numerical instability during a transition step
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// Invalid configuration (time grid, table sizes, solver settings)
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Monte Carlo ensemble error
    #[error("Monte Carlo simulation error with {paths} paths: {reason}")]
    MonteCarloError { paths: usize, reason: String },

    /// Random source produced a draw outside its contract
    #[error("Random number generation error: {reason}")]
    RandomGenerationError { reason: String },

    /// Truncated-Gaussian calibration failure
    #[error("Calibration failed{}: {reason}", describe_residual(.current_error))]
    CalibrationError {
        reason: String,
        current_error: Option<f64>,
    },
}

fn describe_residual(current_error: &Option<f64>) -> String {
    match current_error {
        Some(err) => format!(" (current error: {:.6e})", err),
        None => String::new(),
    }
}

/// Result type alias for heston-variance operations
pub type SdeResult<T> = Result<T, SdeError>;

/// Validation utilities
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        // written as a negated comparison so NaN is rejected too
        if !(value > 0.0) {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> SdeResult<()> {
        if !(value >= 0.0) {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is within a range
    pub fn validate_range(name: &str, value: f64, min: f64, max: f64) -> SdeResult<()> {
        if !(value >= min && value <= max) {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: format!("must be in range [{}, {}]", min, max),
            })
        } else {
            Ok(())
        }
    }

    /// Validate correlation parameter
    pub fn validate_correlation(name: &str, rho: f64) -> SdeResult<()> {
        validate_range(name, rho, -1.0, 1.0)
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if !value.is_finite() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate paths count
    pub fn validate_paths(paths: usize) -> SdeResult<()> {
        if paths == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if paths > 1_000_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> SdeResult<()> {
        if steps == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("kappa", 0.5).is_ok());
        assert!(validate_positive("kappa", 0.0).is_err());
        assert!(validate_positive("kappa", -0.1).is_err());
        assert!(validate_positive("kappa", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_correlation() {
        assert!(validate_correlation("rho", 0.5).is_ok());
        assert!(validate_correlation("rho", -0.9).is_ok());
        assert!(validate_correlation("rho", 1.0).is_ok());
        assert!(validate_correlation("rho", -1.0).is_ok());
        assert!(validate_correlation("rho", 1.1).is_err());
        assert!(validate_correlation("rho", -1.1).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_paths(0).is_err());
        assert!(validate_paths(1_000).is_ok());
        assert!(validate_steps(0).is_err());
        assert!(validate_steps(252).is_ok());
    }

    #[test]
    fn test_error_display() {
        let error = SdeError::InvalidParameters {
            parameter: "kappa".to_string(),
            value: -0.1,
            constraint: "must be positive".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("kappa"));
        assert!(display.contains("-0.1"));
        assert!(display.contains("positive"));
    }

    #[test]
    fn test_calibration_error_display() {
        let with_residual = SdeError::CalibrationError {
            reason: "Newton iteration did not converge".to_string(),
            current_error: Some(1e-3),
        };
        let display = with_residual.to_string();
        assert!(display.starts_with("Calibration failed"));
        assert!(display.contains("current error"));
        assert!(display.contains("did not converge"));

        let without_residual = SdeError::CalibrationError {
            reason: "empty bracket".to_string(),
            current_error: None,
        };
        assert_eq!(without_residual.to_string(), "Calibration failed: empty bracket");
    }
}
