//! Sweep point generation.
//!
//! Batch evaluations (airspeed sweeps, throttle sweeps, efficiency maps) are
//! pure grid evaluations; this module only produces the grid coordinates.

use crate::error::{CoreError, CoreResult};

/// Evenly spaced sweep over one parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepDefinition {
    /// First value
    pub start: f64,
    /// Last value (always emitted exactly)
    pub end: f64,
    /// Number of points to generate
    pub num_points: usize,
}

impl SweepDefinition {
    /// Create a linear sweep, rejecting degenerate definitions.
    pub fn linear(start: f64, end: f64, num_points: usize) -> CoreResult<Self> {
        crate::ensure_finite(start, "sweep start")?;
        crate::ensure_finite(end, "sweep end")?;

        if num_points < 2 {
            return Err(CoreError::InvalidArg {
                what: "sweep must have at least 2 points",
            });
        }
        if (start - end).abs() < 1e-12 {
            return Err(CoreError::InvalidArg {
                what: "sweep start and end must differ",
            });
        }

        Ok(Self { start, end, num_points })
    }

    /// Generate all points in the sweep.
    pub fn generate_points(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.num_points)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (n - 1) as f64;
            let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * delta).collect();
            // Ensure exact endpoint
            points[n - 1] = end;
            points
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_sweep() {
        let sweep = SweepDefinition::linear(0.0, 40.0, 5).unwrap();
        assert_eq!(sweep.generate_points(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn endpoint_is_exact() {
        let points = SweepDefinition::linear(0.1, 0.7, 7).unwrap().generate_points();
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], 0.1);
        assert_eq!(points[6], 0.7);
    }

    #[test]
    fn rejects_bad_definitions() {
        assert!(SweepDefinition::linear(0.0, 1.0, 1).is_err());
        assert!(SweepDefinition::linear(1.0, 1.0, 3).is_err());
        assert!(SweepDefinition::linear(f64::NAN, 1.0, 3).is_err());
        assert!(SweepDefinition::linear(0.0, f64::INFINITY, 3).is_err());
    }

    #[test]
    fn descending_sweep() {
        let points = linspace(1.0, 0.5, 3);
        assert_eq!(points, vec![1.0, 0.75, 0.5]);
    }
}
