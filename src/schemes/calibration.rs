// src/schemes/calibration.rs
//! Moment-matching table for the truncated-Gaussian scheme.
//!
//! # Mathematical Description
//!
//! A Gaussian N(μ, σ²) floored at zero has mean and second moment
//! ```text
//! E[max(X, 0)]   = σ (φ(r) + rΦ(r))
//! E[max(X, 0)²]  = σ² (rφ(r) + (1 + r²)Φ(r))          r = μ/σ
//! ```
//! Matching them to a target mean m and variance s² reduces to finding the
//! root r of
//! ```text
//! h(r, ψ) = rφ(r) + Φ(r)(1 + r²) − (1 + ψ)(φ(r) + rΦ(r))²,   ψ = s²/m²
//! ```
//! after which μ = fμ(ψ)·m and σ = fσ(ψ)·s with
//! ```text
//! fμ(ψ) = r / (φ(r) + rΦ(r))
//! fσ(ψ) = ψ^(−1/2) / (φ(r) + rΦ(r))
//! ```
//! Both factors depend on ψ only, so they are tabulated once on a uniform ψ
//! grid and linearly interpolated during simulation.
//!
//! # Root bracketing
//!
//! `∂h/∂r = 2(φ + rΦ)(1 − (1 + ψ)Φ)`, so h(·, ψ) rises from 0⁺ at −∞ to a
//! positive maximum at r* = Φ⁻¹(1/(1 + ψ)) and then falls to −∞. The unique
//! root therefore lies to the right of r*, and Newton's method is run inside
//! a sign-change bracket `[r*, r_hi]`.

use crate::error::{SdeError, SdeResult};
use crate::math_utils::{
    bracket_index, linspace, newton_bracketed, norm_cdf, norm_inv_cdf, norm_pdf, NewtonConfig,
};
use tracing::{debug, trace};

/// Largest |h(r, ψ)| accepted at a tabulated root.
pub const MAX_ROOT_RESIDUAL: f64 = 1e-8;

const MAX_BRACKET_EXPANSIONS: usize = 64;

/// h(r, ψ): moment mismatch of a zero-floored Gaussian with standardised mean r.
pub fn moment_mismatch(r: f64, psi: f64) -> f64 {
    let phi = norm_pdf(r);
    let cdf = norm_cdf(r);
    let first = phi + r * cdf;
    r * phi + cdf * (1.0 + r * r) - (1.0 + psi) * first * first
}

/// ∂h/∂r.
pub fn moment_mismatch_derivative(r: f64, psi: f64) -> f64 {
    let phi = norm_pdf(r);
    let cdf = norm_cdf(r);
    2.0 * phi + 2.0 * r * cdf - 2.0 * (1.0 + psi) * cdf * (phi + r * cdf)
}

/// Solve h(r, ψ) = 0 starting from `initial_guess`.
pub fn solve_standardised_mean(psi: f64, initial_guess: f64, solver: &NewtonConfig) -> SdeResult<f64> {
    if !(psi > 0.0) || !psi.is_finite() {
        return Err(SdeError::CalibrationError {
            reason: format!("dispersion ratio must be positive and finite, got {}", psi),
            current_error: None,
        });
    }

    let h = |r: f64| moment_mismatch(r, psi);
    let h_prime = |r: f64| moment_mismatch_derivative(r, psi);

    let lo = norm_inv_cdf(1.0 / (1.0 + psi));
    let mut step = 1.0;
    let mut hi = lo + step;
    let mut expansions = 0;
    while h(hi) >= 0.0 {
        expansions += 1;
        if expansions > MAX_BRACKET_EXPANSIONS || !hi.is_finite() {
            return Err(SdeError::CalibrationError {
                reason: format!("could not bracket the root for ψ = {}", psi),
                current_error: Some(h(hi).abs()),
            });
        }
        step *= 2.0;
        hi = lo + step;
    }

    let root = newton_bracketed(h, h_prime, initial_guess, lo, hi, solver)?;
    let residual = h(root).abs();
    if !(residual <= MAX_ROOT_RESIDUAL) {
        return Err(SdeError::CalibrationError {
            reason: format!("root r = {} for ψ = {} does not satisfy h(r, ψ) = 0", root, psi),
            current_error: Some(residual),
        });
    }
    Ok(root)
}

/// Tabulated correction factors fμ(ψ), fσ(ψ) on a uniform ψ grid.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationTable {
    psi: Vec<f64>,
    roots: Vec<f64>,
    f_mu: Vec<f64>,
    f_sigma: Vec<f64>,
}

impl CalibrationTable {
    /// Build the table over `[psi_min, psi_max]` with `size` nodes.
    ///
    /// When `psi_max <= psi_min` no transition can reach the table and it is
    /// left empty.
    pub fn build(
        psi_min: f64,
        psi_max: f64,
        size: usize,
        initial_guess: f64,
        solver: &NewtonConfig,
    ) -> SdeResult<Self> {
        if size < 2 {
            return Err(SdeError::InvalidConfiguration {
                field: "psi_grid_size".to_string(),
                reason: format!("needs at least 2 nodes, got {}", size),
            });
        }

        if psi_max <= psi_min {
            debug!(psi_min, psi_max, "dispersion never exceeds the Gaussian threshold; empty table");
            return Ok(Self::empty());
        }

        let psi = linspace(psi_min, psi_max, size);
        let mut roots = Vec::with_capacity(size);
        let mut f_mu = Vec::with_capacity(size);
        let mut f_sigma = Vec::with_capacity(size);

        for &p in &psi {
            let r = solve_standardised_mean(p, initial_guess, solver)?;
            let first = norm_pdf(r) + r * norm_cdf(r);
            let mu_factor = r / first;
            let sigma_factor = 1.0 / (p.sqrt() * first);
            if !mu_factor.is_finite() || !sigma_factor.is_finite() {
                return Err(SdeError::CalibrationError {
                    reason: format!("non-finite correction factors at ψ = {} (r = {})", p, r),
                    current_error: None,
                });
            }
            trace!(psi = p, r, f_mu = mu_factor, f_sigma = sigma_factor, "calibrated node");
            roots.push(r);
            f_mu.push(mu_factor);
            f_sigma.push(sigma_factor);
        }

        debug!(nodes = size, psi_min, psi_max, "truncated-Gaussian table calibrated");

        Ok(CalibrationTable {
            psi,
            roots,
            f_mu,
            f_sigma,
        })
    }

    fn empty() -> Self {
        CalibrationTable {
            psi: Vec::new(),
            roots: Vec::new(),
            f_mu: Vec::new(),
            f_sigma: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.psi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psi.is_empty()
    }

    pub fn psi_grid(&self) -> &[f64] {
        &self.psi
    }

    pub fn roots(&self) -> &[f64] {
        &self.roots
    }

    pub fn f_mu(&self) -> &[f64] {
        &self.f_mu
    }

    pub fn f_sigma(&self) -> &[f64] {
        &self.f_sigma
    }

    /// Interpolated `(fμ, fσ)` at `psi`, or `None` for an empty table.
    ///
    /// `psi` is clamped to the tabulated range, so values past the last node
    /// reuse the last node's factors.
    pub fn factors(&self, psi: f64) -> Option<(f64, f64)> {
        let (first, last) = (*self.psi.first()?, *self.psi.last()?);
        let psi = psi.clamp(first, last);
        let i = bracket_index(&self.psi, psi);
        let (psi0, psi1) = (self.psi[i], self.psi[i + 1]);
        let w = (psi - psi0) / (psi1 - psi0);
        let f_mu = self.f_mu[i] + w * (self.f_mu[i + 1] - self.f_mu[i]);
        let f_sigma = self.f_sigma[i] + w * (self.f_sigma[i + 1] - self.f_sigma[i]);
        Some((f_mu, f_sigma))
    }
}
