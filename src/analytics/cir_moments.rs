// src/analytics/cir_moments.rs
//! Exact moments of the CIR variance process.
//!
//! ```text
//! E[V_t | V_s = v]   = θ + (v − θ) e^(−κτ)
//! Var[V_t | V_s = v] = v ξ² e^(−κτ)(1 − e^(−κτ))/κ + θ ξ² (1 − e^(−κτ))² / (2κ)
//! ```
//! with τ = t − s. These are the quantities the discretisation schemes match
//! over each step, and the reference for bias checks over whole paths.

use crate::grid::TimeGrid;
use crate::models::heston::HestonParams;

/// E[V_{s+τ} | V_s = v].
pub fn conditional_mean(v: f64, kappa: f64, theta: f64, tau: f64) -> f64 {
    theta + (v - theta) * (-kappa * tau).exp()
}

/// Var[V_{s+τ} | V_s = v].
pub fn conditional_variance(v: f64, kappa: f64, theta: f64, xi: f64, tau: f64) -> f64 {
    let decay = (-kappa * tau).exp();
    let one_minus_decay = -(-kappa * tau).exp_m1();
    v * xi * xi * decay * one_minus_decay / kappa
        + theta * xi * xi * one_minus_decay * one_minus_decay / (2.0 * kappa)
}

/// E[V_t | V_{t0} = v0] at every grid point.
pub fn expected_variance_path(params: &HestonParams, grid: &TimeGrid) -> Vec<f64> {
    let t0 = grid.start();
    grid.points()
        .iter()
        .map(|&t| conditional_mean(params.v0, params.kappa, params.theta, t - t0))
        .collect()
}

/// Var[V_t | V_{t0} = v0] at every grid point.
pub fn variance_of_variance_path(params: &HestonParams, grid: &TimeGrid) -> Vec<f64> {
    let t0 = grid.start();
    grid.points()
        .iter()
        .map(|&t| conditional_variance(params.v0, params.kappa, params.theta, params.xi, t - t0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemes::TransitionCoefficients;
    use approx::assert_relative_eq;

    #[test]
    fn test_agrees_with_transition_coefficients() {
        let params = HestonParams {
            kappa: 0.5,
            theta: 0.04,
            xi: 1.0,
            ..Default::default()
        };
        let grid = TimeGrid::new(vec![0.0, 0.25, 1.0]).unwrap();
        let coefficients = TransitionCoefficients::compute(&grid, &params);
        for (i, tau) in grid.increments().enumerate() {
            let v = 0.07;
            let moments = coefficients.moments(i, v).unwrap();
            assert_relative_eq!(
                moments.mean,
                conditional_mean(v, params.kappa, params.theta, tau),
                max_relative = 1e-13
            );
            assert_relative_eq!(
                moments.variance,
                conditional_variance(v, params.kappa, params.theta, params.xi, tau),
                max_relative = 1e-13
            );
        }
    }

    #[test]
    fn test_path_moments() {
        let params = HestonParams {
            v0: 0.09,
            kappa: 2.0,
            theta: 0.04,
            xi: 0.3,
            ..Default::default()
        };
        let grid = TimeGrid::uniform(5.0, 5).unwrap();
        let means = expected_variance_path(&params, &grid);
        let vars = variance_of_variance_path(&params, &grid);
        assert_eq!(means[0], 0.09);
        assert_eq!(vars[0], 0.0);
        assert!(means.windows(2).all(|w| w[1] < w[0]));
        // Long horizon: stationary Gamma law with variance θξ²/(2κ).
        assert_relative_eq!(means[5], 0.04, epsilon = 1e-5);
        assert_relative_eq!(vars[5], 0.04 * 0.09 / 4.0, max_relative = 1e-3);
    }
}
