// src/grid.rs
use crate::error::{validation::*, SdeError, SdeResult};

/// Observation dates of a simulated path.
///
/// Points are finite and strictly increasing and there are at least two of
/// them. Spacing may be non-uniform.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    pub fn new(points: Vec<f64>) -> SdeResult<Self> {
        if points.len() < 2 {
            return Err(SdeError::InvalidConfiguration {
                field: "time_grid".to_string(),
                reason: format!("needs at least 2 points, got {}", points.len()),
            });
        }
        for &t in &points {
            validate_finite("time_point", t)?;
        }
        if let Some(i) = points.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SdeError::InvalidConfiguration {
                field: "time_grid".to_string(),
                reason: format!(
                    "must be strictly increasing, but t[{}] = {} ≥ t[{}] = {}",
                    i,
                    points[i],
                    i + 1,
                    points[i + 1]
                ),
            });
        }
        Ok(TimeGrid { points })
    }

    /// `steps + 1` equally spaced points over `[0, maturity]`.
    pub fn uniform(maturity: f64, steps: usize) -> SdeResult<Self> {
        validate_positive("maturity", maturity)?;
        validate_steps(steps)?;
        let dt = maturity / steps as f64;
        let mut points: Vec<f64> = (0..=steps).map(|i| i as f64 * dt).collect();
        points[steps] = maturity;
        Self::new(points)
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid has no points; false for any constructed grid.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn steps(&self) -> usize {
        self.points.len() - 1
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    /// Interval lengths `t[i+1] - t[i]`.
    pub fn increments(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.windows(2).map(|w| w[1] - w[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_grid() {
        let grid = TimeGrid::uniform(1.0, 2).unwrap();
        assert_eq!(grid.points(), &[0.0, 0.5, 1.0]);
        assert_eq!(grid.steps(), 2);
        assert_eq!(grid.end(), 1.0);
        let dts: Vec<f64> = grid.increments().collect();
        assert_eq!(dts, vec![0.5, 0.5]);
    }

    #[test]
    fn test_non_uniform_grid() {
        let grid = TimeGrid::new(vec![0.0, 0.1, 0.5, 2.0]).unwrap();
        let dts: Vec<f64> = grid.increments().collect();
        assert!((dts[0] - 0.1).abs() < 1e-15);
        assert!((dts[1] - 0.4).abs() < 1e-15);
        assert!((dts[2] - 1.5).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_invalid_grids() {
        assert!(TimeGrid::new(vec![]).is_err());
        assert!(TimeGrid::new(vec![0.0]).is_err());
        assert!(TimeGrid::new(vec![0.0, 0.5, 0.5]).is_err());
        assert!(TimeGrid::new(vec![0.0, 1.0, 0.5]).is_err());
        assert!(TimeGrid::new(vec![0.0, f64::NAN]).is_err());
        assert!(TimeGrid::uniform(0.0, 10).is_err());
        assert!(TimeGrid::uniform(1.0, 0).is_err());
    }

    #[test]
    fn test_uniform_grid_has_no_step_cap() {
        let grid = TimeGrid::uniform(1.0, 200_000).unwrap();
        assert_eq!(grid.steps(), 200_000);
        assert_eq!(grid.end(), 1.0);
    }
}
