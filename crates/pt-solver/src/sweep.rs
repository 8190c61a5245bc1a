//! Parallel sweeps over independent solves.
//!
//! Every point is an independent call on shared immutable inputs, so the
//! sweeps fan out with rayon. A failed point keeps its typed error and does
//! not abort the sweep.

use pt_motor::MotorSpec;
use pt_prop::PropPerformanceSurface;
use rayon::prelude::*;

use crate::coupling::Supply;
use crate::cruise::{CruisePoint, CruiseSolver};
use crate::equilibrium::{EquilibriumPoint, EquilibriumSolver};
use crate::error::{PowertrainError, PowertrainResult};

/// One sweep point and its outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint<T> {
    pub airspeed_ms: f64,
    /// Fraction of battery voltage, 1.0 for full throttle; `None` for a
    /// cruise point whose solve failed
    pub throttle: Option<f64>,
    pub result: PowertrainResult<T>,
}

impl<T> SweepPoint<T> {
    pub fn ok(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }
}

fn check_throttle(throttle: f64) -> PowertrainResult<f64> {
    if throttle > 0.0 && throttle <= 1.0 {
        Ok(throttle)
    } else {
        Err(PowertrainError::InvalidInput {
            what: "throttle must be in (0, 1]",
        })
    }
}

/// Equilibrium at each airspeed at full supply voltage.
pub fn airspeed_sweep(
    solver: &EquilibriumSolver,
    motor: &MotorSpec,
    prop: &PropPerformanceSurface,
    v_supply: f64,
    winding_temp_c: f64,
    airspeeds: &[f64],
) -> Vec<SweepPoint<EquilibriumPoint>> {
    airspeeds
        .par_iter()
        .map(|&v| SweepPoint {
            airspeed_ms: v,
            throttle: Some(1.0),
            result: solver.solve(motor, prop, v_supply, v, winding_temp_c),
        })
        .collect()
}

/// Equilibrium at each throttle for one airspeed; the motor sees
/// `throttle · v_battery`.
pub fn throttle_sweep(
    solver: &EquilibriumSolver,
    motor: &MotorSpec,
    prop: &PropPerformanceSurface,
    v_battery: f64,
    airspeed_ms: f64,
    winding_temp_c: f64,
    throttles: &[f64],
) -> Vec<SweepPoint<EquilibriumPoint>> {
    throttles
        .par_iter()
        .map(|&t| SweepPoint {
            airspeed_ms,
            throttle: Some(t),
            result: check_throttle(t)
                .and_then(|t| solver.solve(motor, prop, t * v_battery, airspeed_ms, winding_temp_c)),
        })
        .collect()
}

/// Equilibrium over `airspeeds × throttles`, airspeed-major.
pub fn grid_sweep(
    solver: &EquilibriumSolver,
    motor: &MotorSpec,
    prop: &PropPerformanceSurface,
    v_battery: f64,
    winding_temp_c: f64,
    airspeeds: &[f64],
    throttles: &[f64],
) -> Vec<SweepPoint<EquilibriumPoint>> {
    let n_t = throttles.len();
    (0..airspeeds.len() * n_t)
        .into_par_iter()
        .map(|idx| {
            let v = airspeeds[idx / n_t];
            let t = throttles[idx % n_t];
            SweepPoint {
                airspeed_ms: v,
                throttle: Some(t),
                result: check_throttle(t).and_then(|t| solver.solve(motor, prop, t * v_battery, v, winding_temp_c)),
            }
        })
        .collect()
}

/// Cruise solve at each `(airspeed, required thrust)` pair.
///
/// `throttle` on each point is the solved throttle, or `None` when the
/// solve failed.
#[allow(clippy::too_many_arguments)]
pub fn cruise_sweep(
    solver: &CruiseSolver,
    motor: &MotorSpec,
    prop: &PropPerformanceSurface,
    supply: Supply<'_>,
    motor_count: u32,
    winding_temp_c: f64,
    cell_temp_c: f64,
    conditions: &[(f64, f64)],
) -> Vec<SweepPoint<CruisePoint>> {
    conditions
        .par_iter()
        .map(|&(v, thrust)| {
            let result =
                solver.solve_for_thrust(motor, prop, supply, v, thrust, motor_count, winding_temp_c, cell_temp_c);
            SweepPoint {
                airspeed_ms: v,
                throttle: result.as_ref().ok().map(|c| c.throttle),
                result,
            }
        })
        .collect()
}
