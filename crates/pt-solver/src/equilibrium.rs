//! Motor ↔ propeller equilibrium at a fixed supply voltage.
//!
//! Fixed-point iteration on shaft speed:
//!
//! ```text
//! τ_prop(n) = P_prop(v, n) / (n · π/30)
//! n ← solve_operating_point(V, τ_prop(n))
//! ```
//!
//! Motor torque falls with speed while propeller torque rises, so the
//! composed map contracts for realizable motor/propeller pairings.

use pt_core::{ensure_finite, relax, rpm_to_rad_per_s};
use pt_motor::{MotorCircuitModel, MotorSolveConfig, MotorSpec, OperatingPoint};
use pt_prop::PropPerformanceSurface;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{PowertrainError, PowertrainResult};

/// Outer-loop configuration.
#[derive(Clone, Copy, Debug)]
pub struct EquilibriumConfig {
    pub max_outer_iterations: usize,
    /// Converged when successive speeds differ by less than this [RPM]
    pub rpm_tolerance: f64,
    /// Initial guess as a fraction of `kv · V`
    pub seed_fraction: f64,
    /// Weight of the new speed in each update, in (0, 1]
    pub relaxation: f64,
    /// Checked between outer iterations
    pub deadline: Option<Instant>,
    /// Inner motor solve
    pub motor: MotorSolveConfig,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            max_outer_iterations: 20,
            rpm_tolerance: 1.0,
            seed_fraction: 0.85,
            relaxation: 1.0,
            deadline: None,
            motor: MotorSolveConfig::default(),
        }
    }
}

impl EquilibriumConfig {
    fn validate(&self) -> PowertrainResult<()> {
        if self.max_outer_iterations == 0 {
            return Err(PowertrainError::InvalidInput {
                what: "equilibrium needs at least one outer iteration",
            });
        }
        if !(self.rpm_tolerance > 0.0 && self.rpm_tolerance.is_finite()) {
            return Err(PowertrainError::InvalidInput {
                what: "equilibrium rpm tolerance must be positive",
            });
        }
        if !(self.seed_fraction > 0.0 && self.seed_fraction <= 1.0) {
            return Err(PowertrainError::InvalidInput {
                what: "equilibrium seed fraction must be in (0, 1]",
            });
        }
        if !(self.relaxation > 0.0 && self.relaxation <= 1.0) {
            return Err(PowertrainError::InvalidInput {
                what: "equilibrium relaxation must be in (0, 1]",
            });
        }
        Ok(())
    }
}

/// Converged motor/propeller operating point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EquilibriumPoint {
    /// Motor side at the converged speed
    pub motor: OperatingPoint,
    pub airspeed_ms: f64,
    /// Propeller thrust at the converged speed [N]
    pub thrust_n: f64,
    /// Propeller shaft power at the converged speed [W]
    pub prop_power_w: f64,
    /// Propeller torque at the converged speed [N·m]
    pub prop_torque_nm: f64,
    pub prop_efficiency: f64,
    pub outer_iterations: usize,
}

impl EquilibriumPoint {
    pub fn rpm(&self) -> f64 {
        self.motor.rpm
    }

    /// Thrust power over electrical input; zero when static.
    pub fn system_efficiency(&self) -> f64 {
        if self.motor.electrical_power_w > 0.0 && self.thrust_n > 0.0 {
            self.thrust_n * self.airspeed_ms / self.motor.electrical_power_w
        } else {
            0.0
        }
    }

    /// Motor torque minus propeller torque [N·m].
    pub fn torque_mismatch_nm(&self) -> f64 {
        self.motor.torque_nm - self.prop_torque_nm
    }
}

/// Joint motor/propeller solver.
///
/// Immutable once built; share one instance across threads.
#[derive(Debug, Default)]
pub struct EquilibriumSolver {
    config: EquilibriumConfig,
    model: MotorCircuitModel,
}

impl EquilibriumSolver {
    pub fn new(config: EquilibriumConfig) -> Self {
        Self {
            config,
            model: MotorCircuitModel::default(),
        }
    }

    /// Use a motor model carrying a torque-constant correction.
    pub fn with_model(mut self, model: MotorCircuitModel) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &EquilibriumConfig {
        &self.config
    }

    pub fn model(&self) -> &MotorCircuitModel {
        &self.model
    }

    /// Propeller torque at a speed [N·m].
    pub fn prop_torque(&self, prop: &PropPerformanceSurface, airspeed_ms: f64, rpm: f64) -> PowertrainResult<f64> {
        if rpm <= 0.0 {
            return Err(PowertrainError::Infeasible {
                what: "propeller stalls the motor",
                requested: 0.0,
                available: rpm,
            });
        }
        Ok(prop.power(airspeed_ms, rpm)? / rpm_to_rad_per_s(rpm))
    }

    /// Speed where motor torque equals propeller load torque.
    ///
    /// # Errors
    /// - `Prop(OutOfEnvelope ..)` as soon as a speed guess leaves the surface
    /// - `Motor(Infeasible ..)` when the motor cannot carry the load
    /// - `NonConvergence` after `max_outer_iterations`, or
    ///   `DeadlineExceeded` when the configured deadline passes
    pub fn solve(
        &self,
        motor: &MotorSpec,
        prop: &PropPerformanceSurface,
        v_supply: f64,
        airspeed_ms: f64,
        winding_temp_c: f64,
    ) -> PowertrainResult<EquilibriumPoint> {
        self.config.validate()?;
        ensure_finite(v_supply, "supply voltage [V]")?;
        ensure_finite(airspeed_ms, "airspeed [m/s]")?;
        if v_supply <= 0.0 {
            return Err(PowertrainError::InvalidInput {
                what: "supply voltage must be positive",
            });
        }

        let mut rpm = self.config.seed_fraction * motor.no_load_rpm(v_supply);
        let mut change = f64::INFINITY;

        for iter in 1..=self.config.max_outer_iterations {
            if let Some(deadline) = self.config.deadline {
                if Instant::now() >= deadline {
                    return Err(PowertrainError::DeadlineExceeded { iterations: iter - 1 });
                }
            }

            let load = self.prop_torque(prop, airspeed_ms, rpm)?;
            let point = self
                .model
                .solve_operating_point(motor, v_supply, load, winding_temp_c, &self.config.motor)?;
            change = point.rpm - rpm;
            trace!(iter, rpm, load_nm = load, motor_rpm = point.rpm, change, "equilibrium");

            if change.abs() < self.config.rpm_tolerance {
                let prop_point = prop.evaluate(airspeed_ms, point.rpm)?;
                let eq = EquilibriumPoint {
                    motor: point,
                    airspeed_ms,
                    thrust_n: prop_point.thrust_n,
                    prop_power_w: prop_point.power_w,
                    prop_torque_nm: prop_point.power_w / rpm_to_rad_per_s(point.rpm),
                    prop_efficiency: prop.efficiency(airspeed_ms, point.rpm)?,
                    outer_iterations: iter,
                };
                debug!(
                    iterations = iter,
                    rpm = point.rpm,
                    current_a = point.current_a,
                    thrust_n = eq.thrust_n,
                    "powertrain equilibrium converged"
                );
                return Ok(eq);
            }
            rpm = relax(rpm, point.rpm, self.config.relaxation);
        }

        warn!(
            iterations = self.config.max_outer_iterations,
            rpm,
            change,
            "powertrain equilibrium did not converge"
        );
        Err(PowertrainError::NonConvergence {
            what: "powertrain equilibrium",
            iterations: self.config.max_outer_iterations,
            last_change: change,
        })
    }
}
