//! Level-flight solve: the powertrain state that holds a required thrust.
//!
//! The propeller fixes speed and shaft power for the thrust; the motor
//! then needs a terminal voltage to hold that speed against that torque,
//! and the controller's throttle is that voltage over the battery voltage.

use pt_core::{ensure_finite, ensure_positive, rpm_to_rad_per_s};
use pt_motor::{MotorCircuitModel, MotorSpec, OperatingPoint};
use pt_prop::PropPerformanceSurface;
use tracing::debug;

use crate::coupling::Supply;
use crate::error::{PowertrainError, PowertrainResult};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CruisePoint {
    pub airspeed_ms: f64,
    /// Total thrust over all motors [N]
    pub thrust_required_n: f64,
    pub thrust_per_motor_n: f64,
    pub prop_power_w: f64,
    pub prop_efficiency: f64,
    /// Per-motor state at the propeller speed and torque
    pub motor: OperatingPoint,
    /// Required motor voltage over battery voltage; above 1 is unreachable
    pub throttle: f64,
    pub battery_voltage_v: f64,
    /// Total over all motors [A]
    pub battery_current_a: f64,
    pub battery_power_w: f64,
    /// Thrust power over battery power
    pub system_efficiency: f64,
    /// Motor current above its continuous rating
    pub over_current: bool,
    /// Required voltage above the battery voltage
    pub over_throttle: bool,
}

impl CruisePoint {
    /// Reachable without exceeding throttle or motor rating.
    pub fn is_within_limits(&self) -> bool {
        !self.over_current && !self.over_throttle
    }
}

/// Required-thrust solver.
#[derive(Debug, Default)]
pub struct CruiseSolver {
    model: MotorCircuitModel,
}

impl CruiseSolver {
    pub fn new(model: MotorCircuitModel) -> Self {
        Self { model }
    }

    /// Powertrain state delivering `thrust_required_n` split evenly over
    /// `motor_count` propellers at `airspeed_ms`.
    ///
    /// Electrical power passes through the speed controller without loss, so
    /// battery power is the sum of motor electrical powers. For a pack the
    /// battery current is the smaller root of `P = (V_oc − I·R)·I`.
    ///
    /// # Errors
    /// - propeller `Infeasible` / `OutOfEnvelope` from the thrust inversion
    /// - `Battery(Infeasible ..)` beyond the pack's matched-load power
    /// - `InvalidInput` for zero motors or non-finite inputs
    #[allow(clippy::too_many_arguments)]
    pub fn solve_for_thrust(
        &self,
        motor: &MotorSpec,
        prop: &PropPerformanceSurface,
        supply: Supply<'_>,
        airspeed_ms: f64,
        thrust_required_n: f64,
        motor_count: u32,
        winding_temp_c: f64,
        cell_temp_c: f64,
    ) -> PowertrainResult<CruisePoint> {
        ensure_finite(airspeed_ms, "airspeed [m/s]")?;
        ensure_positive(thrust_required_n, "required thrust [N]")?;
        if motor_count == 0 {
            return Err(PowertrainError::InvalidInput {
                what: "cruise needs at least one motor",
            });
        }
        let motors = motor_count as f64;
        let thrust_per_motor = thrust_required_n / motors;

        let sol = prop.power_for_thrust(airspeed_ms, thrust_per_motor)?;
        let torque = sol.power_w / rpm_to_rad_per_s(sol.rpm);
        let point = self.model.state_for_load(motor, sol.rpm, torque, winding_temp_c)?;

        let battery_power = motors * point.electrical_power_w.max(0.0);
        let (battery_voltage, battery_current) = match &supply {
            Supply::Fixed { voltage_v } => {
                let v = ensure_positive(*voltage_v, "supply voltage [V]")?;
                (v, battery_power / v)
            }
            Supply::Pack { pack, soc_percent } => {
                let current = pack.current_for_power(battery_power, *soc_percent, cell_temp_c)?;
                let voltage = pack.loaded_voltage(current, *soc_percent, cell_temp_c)?;
                (voltage, current)
            }
        };

        let throttle = point.voltage_v / battery_voltage;
        let useful_power = thrust_required_n * airspeed_ms;
        let system_efficiency = if battery_power > 0.0 && useful_power > 0.0 {
            useful_power / battery_power
        } else {
            0.0
        };

        let cruise = CruisePoint {
            airspeed_ms,
            thrust_required_n,
            thrust_per_motor_n: thrust_per_motor,
            prop_power_w: sol.power_w,
            prop_efficiency: prop.efficiency(airspeed_ms, sol.rpm)?,
            motor: point,
            throttle,
            battery_voltage_v: battery_voltage,
            battery_current_a: battery_current,
            battery_power_w: battery_power,
            system_efficiency,
            over_current: point.current_a > motor.i_max_a,
            over_throttle: throttle > 1.0,
        };
        debug!(
            airspeed_ms,
            rpm = point.rpm,
            throttle,
            battery_current_a = battery_current,
            "cruise point"
        );
        Ok(cruise)
    }
}
