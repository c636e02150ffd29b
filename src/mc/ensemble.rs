// src/mc/ensemble.rs
//! Parallel generation of independent variance paths.
//!
//! Paths are embarrassingly parallel: each one only reads the simulator's
//! immutable grid, snapshot and tables. Path `i` always draws from
//! `RngFactory::create_counter_rng(i)`, so the ensemble is identical for any
//! number of Rayon threads.

use crate::error::{validation::*, SdeError, SdeResult};
use crate::rng::RngFactory;
use crate::schemes::VariancePathSimulator;
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct EnsembleConfig {
    pub paths: usize,
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            paths: 10_000,
            seed: 12345,
        }
    }
}

impl EnsembleConfig {
    pub fn validate(&self) -> SdeResult<()> {
        validate_paths(self.paths)
    }
}

/// Generate `cfg.paths` independent paths.
pub fn simulate_paths<S>(simulator: &S, cfg: &EnsembleConfig) -> SdeResult<Vec<Vec<f64>>>
where
    S: VariancePathSimulator + ?Sized,
{
    cfg.validate()?;
    let factory = RngFactory::new(cfg.seed);
    (0..cfg.paths)
        .into_par_iter()
        .map(|i| {
            let mut rng = factory.create_counter_rng(i as u64);
            simulator.generate_path(&mut rng)
        })
        .collect()
}

/// Per-date sample statistics of an ensemble.
#[derive(Clone, Debug, PartialEq)]
pub struct PathStatistics {
    pub paths: usize,
    pub mean: Vec<f64>,
    /// Unbiased sample variance.
    pub variance: Vec<f64>,
    /// Fraction of paths sitting exactly at zero.
    pub zero_fraction: Vec<f64>,
}

#[derive(Clone, Debug)]
struct Accumulator {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    zeros: Vec<usize>,
}

impl Accumulator {
    fn new(points: usize) -> Self {
        Accumulator {
            sum: vec![0.0; points],
            sum_sq: vec![0.0; points],
            zeros: vec![0; points],
        }
    }

    fn add_path(mut self, path: &[f64]) -> Self {
        for (i, &v) in path.iter().enumerate() {
            self.sum[i] += v;
            self.sum_sq[i] += v * v;
            if v == 0.0 {
                self.zeros[i] += 1;
            }
        }
        self
    }

    fn merge(mut self, other: Accumulator) -> Self {
        for i in 0..self.sum.len() {
            self.sum[i] += other.sum[i];
            self.sum_sq[i] += other.sum_sq[i];
            self.zeros[i] += other.zeros[i];
        }
        self
    }

    fn finish(self, paths: usize) -> PathStatistics {
        let n = paths as f64;
        let mean: Vec<f64> = self.sum.iter().map(|s| s / n).collect();
        let variance = if paths > 1 {
            self.sum_sq
                .iter()
                .zip(&mean)
                .map(|(sq, m)| ((sq - n * m * m) / (n - 1.0)).max(0.0))
                .collect()
        } else {
            vec![0.0; mean.len()]
        };
        let zero_fraction = self.zeros.iter().map(|&z| z as f64 / n).collect();
        PathStatistics {
            paths,
            mean,
            variance,
            zero_fraction,
        }
    }
}

impl PathStatistics {
    /// Statistics of already generated paths.
    pub fn from_paths(paths: &[Vec<f64>]) -> SdeResult<Self> {
        let points = match paths.first() {
            Some(first) => first.len(),
            None => {
                return Err(SdeError::MonteCarloError {
                    paths: 0,
                    reason: "no paths to summarise".to_string(),
                })
            }
        };
        if let Some(bad) = paths.iter().position(|p| p.len() != points) {
            return Err(SdeError::MonteCarloError {
                paths: paths.len(),
                reason: format!(
                    "path {} has {} points, expected {}",
                    bad,
                    paths[bad].len(),
                    points
                ),
            });
        }
        let acc = paths
            .iter()
            .fold(Accumulator::new(points), |acc, path| acc.add_path(path));
        Ok(acc.finish(paths.len()))
    }

    /// Simulate and summarise in one parallel pass without storing paths.
    pub fn simulate<S>(simulator: &S, cfg: &EnsembleConfig) -> SdeResult<Self>
    where
        S: VariancePathSimulator + ?Sized,
    {
        cfg.validate()?;
        let points = simulator.grid().len();
        let factory = RngFactory::new(cfg.seed);
        let acc = (0..cfg.paths)
            .into_par_iter()
            .map(|i| {
                let mut rng = factory.create_counter_rng(i as u64);
                simulator.generate_path(&mut rng)
            })
            .try_fold(
                || Accumulator::new(points),
                |acc, path| path.map(|p| acc.add_path(&p)),
            )
            .try_reduce(|| Accumulator::new(points), |a, b| Ok(a.merge(b)))?;
        Ok(acc.finish(cfg.paths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TimeGrid;
    use crate::models::heston::HestonParams;
    use crate::schemes::{SchemeKind, VarianceScheme};
    use approx::assert_relative_eq;

    fn reference_scheme(kind: SchemeKind) -> VarianceScheme {
        let grid = TimeGrid::uniform(1.0, 8).unwrap();
        let params = HestonParams {
            kappa: 2.0,
            theta: 0.04,
            xi: 0.3,
            v0: 0.04,
            ..Default::default()
        };
        VarianceScheme::new(kind, grid, params).unwrap()
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let scheme = reference_scheme(SchemeKind::QuadraticExponential);
        let cfg = EnsembleConfig {
            paths: 64,
            seed: 3,
        };
        let a = simulate_paths(&scheme, &cfg).unwrap();
        let b = simulate_paths(&scheme, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn test_streaming_statistics_match_stored_paths() {
        let scheme = reference_scheme(SchemeKind::TruncatedGaussian);
        let cfg = EnsembleConfig {
            paths: 500,
            seed: 8,
        };
        let paths = simulate_paths(&scheme, &cfg).unwrap();
        let stored = PathStatistics::from_paths(&paths).unwrap();
        let streamed = PathStatistics::simulate(&scheme, &cfg).unwrap();
        assert_eq!(stored.paths, streamed.paths);
        for i in 0..stored.mean.len() {
            assert_relative_eq!(stored.mean[i], streamed.mean[i], max_relative = 1e-10);
            assert_relative_eq!(stored.variance[i], streamed.variance[i], max_relative = 1e-8, epsilon = 1e-15);
            assert_eq!(stored.zero_fraction[i], streamed.zero_fraction[i]);
        }
        assert_relative_eq!(stored.mean[0], 0.04, max_relative = 1e-12);
        assert!(stored.variance[0] < 1e-15);
        assert_eq!(stored.zero_fraction[0], 0.0);
    }

    #[test]
    fn test_works_through_trait_object() {
        let scheme: Box<dyn VariancePathSimulator> =
            Box::new(reference_scheme(SchemeKind::QuadraticExponential));
        let stats = PathStatistics::simulate(scheme.as_ref(), &EnsembleConfig::default()).unwrap();
        assert_eq!(stats.mean.len(), 9);
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let scheme = reference_scheme(SchemeKind::QuadraticExponential);
        let cfg = EnsembleConfig {
            paths: 0,
            seed: 1,
        };
        assert!(simulate_paths(&scheme, &cfg).is_err());
        assert!(PathStatistics::from_paths(&[]).is_err());
        assert!(PathStatistics::from_paths(&[vec![0.04, 0.05], vec![0.04]]).is_err());
    }
}
