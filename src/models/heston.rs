// src/models/heston.rs
//! Heston Stochastic Volatility Model Parameters
//!
//! # Mathematical Framework
//!
//! ```text
//! dS_t = r S_t dt + √V_t S_t dW_t^(1)
//! dV_t = κ(θ - V_t) dt + ξ√V_t dW_t^(2)
//! ```
//!
//! Where:
//! - V_t: Instantaneous variance (volatility squared)
//! - κ: Mean reversion speed for variance
//! - θ: Long-term variance level
//! - ξ: Volatility of variance (vol-of-vol), written ε in Andersen (2008)
//! - ρ: Correlation between dW_t^(1) and dW_t^(2)
//!
//! Only the variance leg is simulated by this crate; `s0`, `r` and `rho` are
//! carried so that downstream asset-path schemes can read them back from a
//! simulator's snapshot.
//!
//! # Feller Condition
//!
//! ```text
//! 2κθ > ξ²
//! ```
//!
//! When violated the variance can reach zero. Both discretisation schemes handle
//! this regime, so a violation is logged rather than rejected.

use crate::error::{validation::*, SdeResult};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HestonParams {
    pub s0: f64,    // Initial stock price
    pub v0: f64,    // Initial variance
    pub r: f64,     // Risk-free rate
    pub kappa: f64, // Mean reversion speed
    pub theta: f64, // Long-term variance
    pub xi: f64,    // Volatility of variance (vol-of-vol)
    pub rho: f64,   // Correlation between stock and variance
}

impl Default for HestonParams {
    fn default() -> Self {
        HestonParams {
            s0: 100.0,
            v0: 0.04,
            r: 0.0,
            kappa: 0.5,
            theta: 0.04,
            xi: 1.0,
            rho: -0.9,
        }
    }
}

impl HestonParams {
    /// Validate Heston parameters.
    ///
    /// κ must be strictly positive: the transition coefficients divide by κ,
    /// so a model without mean reversion is not supported. `s0` is carried
    /// but never read by the variance process, so it is not checked.
    pub fn validate(&self) -> SdeResult<()> {
        validate_non_negative("v0", self.v0)?;
        validate_finite("v0", self.v0)?;
        validate_finite("r", self.r)?;
        for (name, value) in [("kappa", self.kappa), ("theta", self.theta), ("xi", self.xi)] {
            validate_positive(name, value)?;
            validate_finite(name, value)?;
        }
        validate_correlation("rho", self.rho)
    }

    /// ξ²/(2κθ): the largest dispersion ratio ψ a one-step transition can
    /// produce (attained at V = 0).
    pub fn feller_ratio(&self) -> f64 {
        self.xi * self.xi / (2.0 * self.kappa * self.theta)
    }

    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.kappa * self.theta > self.xi * self.xi
    }

    /// Validate and log a warning if the Feller condition fails.
    pub(crate) fn validate_for_simulation(&self) -> SdeResult<()> {
        self.validate()?;
        if !self.satisfies_feller() {
            warn!(
                kappa = self.kappa,
                theta = self.theta,
                xi = self.xi,
                "Feller condition violated (2κθ ≤ ξ²); variance may hit zero"
            );
        }
        Ok(())
    }
}
