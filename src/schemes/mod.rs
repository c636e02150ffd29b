// src/schemes/mod.rs
//! Discretisation schemes for the Heston variance process.
//!
//! Every scheme shares the same skeleton: a validated time grid, an owned
//! snapshot of the model parameters and the per-interval moment coefficients
//! ([`SimulatorCore`]). A path is produced by applying the scheme's one-step
//! transition law from `v0` across the grid.
//!
//! Two transition laws from Andersen (2008) are available:
//! 1. **Truncated Gaussian (TG)**: moment-matched Gaussian floored at zero,
//!    using a calibration table built once per instance.
//! 2. **Quadratic Exponential (QE)**: squared Gaussian for low dispersion,
//!    point mass at zero plus exponential tail for high dispersion.
//!
//! Schemes can be used through the [`VariancePathSimulator`] trait object
//! (`Box<dyn VariancePathSimulator>` is `Clone`) or the [`VarianceScheme`]
//! enum.

pub mod calibration;
pub mod coefficients;
pub mod quadratic_exponential;
pub mod truncated_gaussian;

pub use calibration::CalibrationTable;
pub use coefficients::{ConditionalMoments, TransitionCoefficients};
pub use quadratic_exponential::{QeConfig, QuadraticExponentialScheme};
pub use truncated_gaussian::{TgConfig, TruncatedGaussianScheme};

use crate::error::{SdeError, SdeResult};
use crate::grid::TimeGrid;
use crate::models::heston::HestonParams;
use crate::rng::RandomSource;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeKind {
    TruncatedGaussian,
    QuadraticExponential,
}

impl SchemeKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemeKind::TruncatedGaussian => "Truncated Gaussian",
            SchemeKind::QuadraticExponential => "Quadratic Exponential",
        }
    }
}

/// State shared by all schemes: grid, parameter snapshot, coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulatorCore {
    grid: TimeGrid,
    params: HestonParams,
    coefficients: TransitionCoefficients,
}

impl SimulatorCore {
    pub fn new(grid: TimeGrid, params: HestonParams) -> SdeResult<Self> {
        params.validate_for_simulation()?;
        let coefficients = TransitionCoefficients::compute(&grid, &params);
        Ok(SimulatorCore {
            grid,
            params,
            coefficients,
        })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn params(&self) -> &HestonParams {
        &self.params
    }

    pub fn coefficients(&self) -> &TransitionCoefficients {
        &self.coefficients
    }

    /// Validated conditional moments for a step from `current`.
    pub fn moments(&self, method: &str, index: usize, current: f64) -> SdeResult<ConditionalMoments> {
        if !current.is_finite() || current < 0.0 {
            return Err(SdeError::NumericalInstability {
                method: method.to_string(),
                reason: format!("variance is invalid at step {}: {}", index, current),
            });
        }
        let moments = self.coefficients.moments(index, current)?;
        check_moments(method, &moments)?;
        Ok(moments)
    }
}

/// Reject moments for which ψ = s²/m² is undefined or non-physical.
pub(crate) fn check_moments(method: &str, moments: &ConditionalMoments) -> SdeResult<()> {
    let psi = moments.psi();
    if !(moments.mean > 0.0) || !(psi > 0.0) || !psi.is_finite() {
        return Err(SdeError::NumericalInstability {
            method: method.to_string(),
            reason: format!(
                "non-physical conditional moments: m = {}, s² = {}, ψ = {}",
                moments.mean, moments.variance, psi
            ),
        });
    }
    Ok(())
}

/// Reject a sampled value that is not a valid variance.
pub(crate) fn check_output(method: &str, value: f64) -> SdeResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(SdeError::NumericalInstability {
            method: method.to_string(),
            reason: format!("variance became invalid after step: {}", value),
        });
    }
    Ok(value)
}

/// A simulator of discretised variance paths.
///
/// Implementors are immutable after construction; randomness is supplied per
/// call, so one instance can serve many threads provided each thread brings
/// its own [`RandomSource`].
pub trait VariancePathSimulator: Send + Sync + fmt::Debug {
    fn grid(&self) -> &TimeGrid;

    /// Snapshot of the model parameters taken at construction.
    fn params(&self) -> &HestonParams;

    fn coefficients(&self) -> &TransitionCoefficients;

    fn scheme_name(&self) -> &'static str;

    /// Sample V(t[index + 1]) given V(t[index]) = `current`.
    fn transition_step(
        &self,
        index: usize,
        current: f64,
        rng: &mut dyn RandomSource,
    ) -> SdeResult<f64>;

    /// Independent deep copy behind a fresh box.
    fn box_clone(&self) -> Box<dyn VariancePathSimulator>;

    /// One path aligned with `grid()`: element 0 is `v0`, element `i + 1` is
    /// the transition from element `i`.
    fn generate_path(&self, rng: &mut dyn RandomSource) -> SdeResult<Vec<f64>> {
        let points = self.grid().len();
        let mut path = Vec::with_capacity(points);
        let mut current = self.params().v0;
        path.push(current);
        for index in 0..points - 1 {
            current = self.transition_step(index, current, rng)?;
            path.push(current);
        }
        Ok(path)
    }
}

impl Clone for Box<dyn VariancePathSimulator> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Closed set of schemes, dispatched by `match`.
#[derive(Clone, Debug)]
pub enum VarianceScheme {
    TruncatedGaussian(TruncatedGaussianScheme),
    QuadraticExponential(QuadraticExponentialScheme),
}

impl VarianceScheme {
    /// Build a scheme of the given kind with its default configuration.
    pub fn new(kind: SchemeKind, grid: TimeGrid, params: HestonParams) -> SdeResult<Self> {
        match kind {
            SchemeKind::TruncatedGaussian => Ok(VarianceScheme::TruncatedGaussian(
                TruncatedGaussianScheme::new(grid, params, TgConfig::default())?,
            )),
            SchemeKind::QuadraticExponential => Ok(VarianceScheme::QuadraticExponential(
                QuadraticExponentialScheme::new(grid, params, QeConfig::default())?,
            )),
        }
    }

    pub fn kind(&self) -> SchemeKind {
        match self {
            VarianceScheme::TruncatedGaussian(_) => SchemeKind::TruncatedGaussian,
            VarianceScheme::QuadraticExponential(_) => SchemeKind::QuadraticExponential,
        }
    }

    fn inner(&self) -> &dyn VariancePathSimulator {
        match self {
            VarianceScheme::TruncatedGaussian(scheme) => scheme,
            VarianceScheme::QuadraticExponential(scheme) => scheme,
        }
    }
}

impl From<TruncatedGaussianScheme> for VarianceScheme {
    fn from(scheme: TruncatedGaussianScheme) -> Self {
        VarianceScheme::TruncatedGaussian(scheme)
    }
}

impl From<QuadraticExponentialScheme> for VarianceScheme {
    fn from(scheme: QuadraticExponentialScheme) -> Self {
        VarianceScheme::QuadraticExponential(scheme)
    }
}

impl VariancePathSimulator for VarianceScheme {
    fn grid(&self) -> &TimeGrid {
        self.inner().grid()
    }

    fn params(&self) -> &HestonParams {
        self.inner().params()
    }

    fn coefficients(&self) -> &TransitionCoefficients {
        self.inner().coefficients()
    }

    fn scheme_name(&self) -> &'static str {
        self.kind().name()
    }

    fn transition_step(
        &self,
        index: usize,
        current: f64,
        rng: &mut dyn RandomSource,
    ) -> SdeResult<f64> {
        self.inner().transition_step(index, current, rng)
    }

    fn box_clone(&self) -> Box<dyn VariancePathSimulator> {
        Box::new(self.clone())
    }
}
