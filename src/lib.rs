//! # heston-variance: Discretisation Schemes for the Heston Variance Process
//!
//! Simulates paths of the CIR variance process of the Heston model
//!
//! ```text
//! dV_t = κ(θ − V_t) dt + ξ √V_t dW_t
//! ```
//!
//! with the moment-matching schemes of Andersen (2008).
//!
//! ## Key Features
//!
//! - **Truncated Gaussian (TG)**: floored Gaussian steps, moment-matched through
//!   a calibration table solved once per simulator
//! - **Quadratic Exponential (QE)**: closed-form squared-Gaussian / exponential
//!   mixture steps
//! - **Non-uniform grids**: moment coefficients are precomputed per interval
//! - **Parallel ensembles**: reproducible Rayon-parallel path generation
//!
//! ## Quick Start
//!
//! ```rust
//! use heston_variance::grid::TimeGrid;
//! use heston_variance::models::heston::HestonParams;
//! use heston_variance::rng::seed_rng_from_u64;
//! use heston_variance::schemes::{QuadraticExponentialScheme, VariancePathSimulator};
//!
//! let params = HestonParams {
//!     v0: 0.04,
//!     kappa: 0.5,
//!     theta: 0.04,
//!     xi: 1.0,
//!     ..Default::default()
//! };
//! let grid = TimeGrid::uniform(1.0, 12).expect("Valid grid");
//! let scheme = QuadraticExponentialScheme::with_defaults(grid, params).expect("Valid parameters");
//!
//! let mut rng = seed_rng_from_u64(42);
//! let path = scheme.generate_path(&mut rng).expect("Path generation");
//! assert_eq!(path.len(), 13);
//! assert!(path.iter().all(|v| *v >= 0.0));
//! ```

// Module declarations
pub mod analytics;
pub mod error;
pub mod grid;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod rng;
pub mod schemes;

// Re-export commonly used types for convenience
pub use error::{SdeError, SdeResult};
pub use grid::TimeGrid;
pub use models::heston::HestonParams;
pub use schemes::{
    QuadraticExponentialScheme, SchemeKind, TruncatedGaussianScheme, VariancePathSimulator,
    VarianceScheme,
};
