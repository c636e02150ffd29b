// src/math_utils.rs
use crate::error::{validation::*, SdeError, SdeResult};
use statrs::function::erf;
use std::f64::consts::SQRT_2;

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal density φ(x).
pub fn norm_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF Φ(x), via `erfc` to keep precision in the left tail.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erf::erfc(-x / SQRT_2)
}

/// Standard normal quantile Φ⁻¹(p) for p in (0, 1).
pub fn norm_inv_cdf(p: f64) -> f64 {
    -SQRT_2 * erf::erfc_inv(2.0 * p)
}

/// `n` evenly spaced points over `[min, max]`; the last point is exactly `max`.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| min + i as f64 * step).collect();
            points[n - 1] = max;
            points
        }
    }
}

/// Start index of the interval of `grid` bracketing `x`.
///
/// Returns the rightmost `i` with `grid[i] <= x`, clamped to `[0, len - 2]` so
/// that `grid[i + 1]` is always readable. `grid` must hold at least two
/// strictly increasing points.
pub fn bracket_index(grid: &[f64], x: f64) -> usize {
    debug_assert!(grid.len() >= 2);
    let pos = grid.partition_point(|&g| g <= x);
    pos.saturating_sub(1).min(grid.len() - 2)
}

/// Settings for the bracketed Newton solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonConfig {
    /// Stop once `|f(x)|` falls below this value.
    pub tolerance: f64,
    /// Stop once the bracket is narrower than this (relative to `1 + |x|`).
    pub step_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        NewtonConfig {
            tolerance: 1e-13,
            step_tolerance: 1e-15,
            max_iterations: 200,
        }
    }
}

impl NewtonConfig {
    pub fn validate(&self) -> SdeResult<()> {
        validate_positive("tolerance", self.tolerance)?;
        validate_positive("step_tolerance", self.step_tolerance)?;
        if self.max_iterations == 0 {
            return Err(SdeError::InvalidConfiguration {
                field: "max_iterations".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Newton's method safeguarded by a sign-change bracket.
///
/// Iterates `x_{n+1} = x_n - f(x_n)/f'(x_n)` from `x0`, falling back to
/// bisection whenever the Newton step is undefined or leaves the current
/// bracket. `f(lo)` and `f(hi)` must have opposite signs.
///
/// # Errors
///
/// `SdeError::CalibrationError` when the bracket is invalid, an iterate is not
/// finite, or the iteration budget runs out.
pub fn newton_bracketed<F, G>(
    f: F,
    f_prime: G,
    x0: f64,
    lo: f64,
    hi: f64,
    config: &NewtonConfig,
) -> SdeResult<f64>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    let f_lo = f(lo);
    let f_hi = f(hi);
    if !f_lo.is_finite() || !f_hi.is_finite() {
        return Err(SdeError::CalibrationError {
            reason: format!("non-finite function value at bracket [{}, {}]", lo, hi),
            current_error: None,
        });
    }
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(SdeError::CalibrationError {
            reason: format!("no sign change over bracket [{}, {}]", lo, hi),
            current_error: Some(f_lo.abs().min(f_hi.abs())),
        });
    }

    // Orient so that f(neg) < 0 < f(pos).
    let (mut neg, mut pos) = if f_lo < 0.0 { (lo, hi) } else { (hi, lo) };
    let (left, right) = (lo.min(hi), lo.max(hi));
    let mut x = if x0.is_finite() && x0 > left && x0 < right {
        x0
    } else {
        0.5 * (lo + hi)
    };

    let mut fx = f(x);
    for _ in 0..config.max_iterations {
        if !fx.is_finite() {
            return Err(SdeError::CalibrationError {
                reason: format!("non-finite function value at x = {}", x),
                current_error: None,
            });
        }
        if fx.abs() < config.tolerance {
            return Ok(x);
        }

        if fx < 0.0 {
            neg = x;
        } else {
            pos = x;
        }
        if (pos - neg).abs() <= config.step_tolerance * (1.0 + x.abs()) {
            return Ok(x);
        }

        let dfx = f_prime(x);
        let newton = x - fx / dfx;
        let (a, b) = (neg.min(pos), neg.max(pos));
        x = if dfx != 0.0 && newton.is_finite() && newton > a && newton < b {
            newton
        } else {
            0.5 * (neg + pos)
        };
        fx = f(x);
    }

    Err(SdeError::CalibrationError {
        reason: format!(
            "Newton iteration did not converge in {} iterations",
            config.max_iterations
        ),
        current_error: Some(fx.abs()),
    })
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_functions() {
        assert_relative_eq!(norm_pdf(0.0), 0.398_942_280_401_432_7, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(1.959_963_984_540_054), 0.975, epsilon = 1e-11);
        assert_relative_eq!(norm_cdf(-1.0) + norm_cdf(1.0), 1.0, epsilon = 1e-15);
        assert!(norm_cdf(-30.0) > 0.0);
    }

    #[test]
    fn test_inverse_cdf_round_trip() {
        assert!(norm_inv_cdf(0.5).abs() < 1e-12);
        for &p in &[1e-10, 0.001, 0.1, 0.3, 0.7, 0.975, 0.999_999] {
            assert_relative_eq!(norm_cdf(norm_inv_cdf(p)), p, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_linspace() {
        let grid = linspace(0.0625, 25.0, 5);
        assert_eq!(grid.len(), 5);
        assert_eq!(grid[0], 0.0625);
        assert_eq!(grid[4], 25.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_bracket_index() {
        let grid = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bracket_index(&grid, 0.0), 0);
        assert_eq!(bracket_index(&grid, 0.5), 0);
        assert_eq!(bracket_index(&grid, 1.0), 1);
        assert_eq!(bracket_index(&grid, 2.999), 2);
        // Right edge and beyond stay on the last interval.
        assert_eq!(bracket_index(&grid, 3.0), 2);
        assert_eq!(bracket_index(&grid, 10.0), 2);
        // Left of the grid stays on the first interval.
        assert_eq!(bracket_index(&grid, -1.0), 0);
    }

    #[test]
    fn test_newton_bracketed_sqrt2() {
        let config = NewtonConfig::default();
        let root =
            newton_bracketed(|x| x * x - 2.0, |x| 2.0 * x, 1.0, 0.0, 2.0, &config).unwrap();
        assert_relative_eq!(root, std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_newton_bracketed_recovers_from_bad_guess() {
        // atan overshoots wildly under plain Newton from x0 = 3.
        let config = NewtonConfig::default();
        let root = newton_bracketed(
            |x: f64| x.atan(),
            |x: f64| 1.0 / (1.0 + x * x),
            3.0,
            -5.0,
            10.0,
            &config,
        )
        .unwrap();
        assert!(root.abs() < 1e-12);
    }

    #[test]
    fn test_newton_bracketed_rejects_bad_bracket() {
        let config = NewtonConfig::default();
        let result = newton_bracketed(|x| x * x + 1.0, |x| 2.0 * x, 0.0, -1.0, 1.0, &config);
        assert!(matches!(result, Err(SdeError::CalibrationError { .. })));
    }

    #[test]
    fn test_newton_bracketed_reports_exhausted_budget() {
        let config = NewtonConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let result = newton_bracketed(|x: f64| x.atan(), |x| 1.0 / (1.0 + x * x), 3.0, -5.0, 10.0, &config);
        match result {
            Err(SdeError::CalibrationError { current_error, .. }) => {
                assert!(current_error.is_some())
            }
            other => panic!("expected calibration error, got {:?}", other),
        }
    }

    #[test]
    fn test_newton_config_validation() {
        assert!(NewtonConfig::default().validate().is_ok());
        let bad = NewtonConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
