// src/schemes/coefficients.rs
//! Per-interval conditional moment coefficients of the CIR variance process.
//!
//! Over an interval of length Δ the exact conditional moments of V are affine
//! in the starting value:
//! ```text
//! m  = E[V(t+Δ) | V(t) = V]   = k1·V + k2
//! s² = Var[V(t+Δ) | V(t) = V] = k3·V + k4
//!
//! k1 = e^(−κΔ)
//! k2 = θ(1 − e^(−κΔ))
//! k3 = ξ² e^(−κΔ)(1 − e^(−κΔ)) / κ
//! k4 = θ ξ² (1 − e^(−κΔ))² / (2κ)
//! ```
//! One set is stored per grid interval, so non-uniform grids are handled
//! without assuming a fixed step.

use crate::error::{SdeError, SdeResult};
use crate::grid::TimeGrid;
use crate::models::heston::HestonParams;

/// Mean and variance of the one-step transition law.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditionalMoments {
    pub mean: f64,
    pub variance: f64,
}

impl ConditionalMoments {
    /// Squared coefficient of variation ψ = s²/m².
    pub fn psi(&self) -> f64 {
        self.variance / (self.mean * self.mean)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionCoefficients {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
}

impl TransitionCoefficients {
    /// Precompute the coefficients for every interval of `grid`.
    ///
    /// `params.kappa` must be positive (see [`HestonParams::validate`]).
    pub fn compute(grid: &TimeGrid, params: &HestonParams) -> Self {
        let kappa = params.kappa;
        let theta = params.theta;
        let xi2 = params.xi * params.xi;
        let n = grid.steps();

        let mut coefficients = TransitionCoefficients {
            k1: Vec::with_capacity(n),
            k2: Vec::with_capacity(n),
            k3: Vec::with_capacity(n),
            k4: Vec::with_capacity(n),
        };

        for delta in grid.increments() {
            let decay = (-kappa * delta).exp();
            // 1 − e^(−κΔ) without cancellation for small κΔ
            let one_minus_decay = -(-kappa * delta).exp_m1();
            coefficients.k1.push(decay);
            coefficients.k2.push(theta * one_minus_decay);
            coefficients.k3.push(xi2 * decay * one_minus_decay / kappa);
            coefficients
                .k4
                .push(theta * xi2 * one_minus_decay * one_minus_decay / (2.0 * kappa));
        }

        coefficients
    }

    pub fn len(&self) -> usize {
        self.k1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k1.is_empty()
    }

    pub fn k1(&self) -> &[f64] {
        &self.k1
    }

    pub fn k2(&self) -> &[f64] {
        &self.k2
    }

    pub fn k3(&self) -> &[f64] {
        &self.k3
    }

    pub fn k4(&self) -> &[f64] {
        &self.k4
    }

    /// Conditional moments over interval `index` starting from `current`.
    pub fn moments(&self, index: usize, current: f64) -> SdeResult<ConditionalMoments> {
        if index >= self.len() {
            return Err(SdeError::InvalidParameters {
                parameter: "index".to_string(),
                value: index as f64,
                constraint: format!("step index must be below {}", self.len()),
            });
        }
        Ok(ConditionalMoments {
            mean: self.k1[index] * current + self.k2[index],
            variance: self.k3[index] * current + self.k4[index],
        })
    }
}
