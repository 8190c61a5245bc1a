//! Thermal-electrical coupling around the equilibrium solve.
//!
//! Winding and cell temperatures feed back into winding and internal
//! resistance; a pack supply also sags with the current drawn. Both the
//! steady outer iteration and the transient march reuse
//! [`EquilibriumSolver::solve`] for the mechanical side.

use pt_battery::PackConfig;
use pt_core::{ensure_finite, ensure_non_negative, ensure_positive, relax};
use pt_motor::MotorSpec;
use pt_prop::PropPerformanceSurface;
use pt_thermal::{HeatCorrection, JouleOnly, ThermalMass, ThermalState, steady_state};
use tracing::{debug, trace, warn};

use crate::equilibrium::{EquilibriumPoint, EquilibriumSolver};
use crate::error::{PowertrainError, PowertrainResult};

/// Most steps one transient march will take.
pub const MAX_MARCH_STEPS: usize = 1_000_000;

/// Where the motor supply voltage comes from.
#[derive(Clone, Copy, Debug)]
pub enum Supply<'a> {
    /// Regulated bus at a fixed voltage
    Fixed { voltage_v: f64 },
    /// Battery pack at a state of charge; terminal voltage sags with current
    Pack { pack: PackConfig<'a>, soc_percent: f64 },
}

impl Supply<'_> {
    /// Voltage with no current drawn.
    pub fn open_circuit_voltage(&self) -> PowertrainResult<f64> {
        match self {
            Self::Fixed { voltage_v } => Ok(ensure_positive(*voltage_v, "supply voltage [V]")?),
            Self::Pack { pack, soc_percent } => Ok(pack.open_circuit_voltage(*soc_percent)?),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CouplingConfig {
    pub ambient_c: f64,
    /// Maximum steady outer passes
    pub max_passes: usize,
    /// Converged when winding and cell temperatures move less than this [°C]
    pub temp_tolerance_c: f64,
    /// ... and the pack terminal voltage moves less than this [V]
    pub voltage_tolerance_v: f64,
    /// Weight of the new pack voltage in each pass, in (0, 1]
    pub voltage_relaxation: f64,
    /// Winding to ambient [°C/W]
    pub motor_r_thermal_c_per_w: f64,
    /// Motor thermal mass for the transient march [g]
    pub motor_mass_g: f64,
    pub motor_specific_heat_j_per_g_c: f64,
    /// Identical motors sharing the pack
    pub motor_count: u32,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            ambient_c: 25.0,
            max_passes: 8,
            temp_tolerance_c: 0.5,
            voltage_tolerance_v: 0.01,
            voltage_relaxation: 0.7,
            motor_r_thermal_c_per_w: 1.0,
            motor_mass_g: 60.0,
            motor_specific_heat_j_per_g_c: 0.9,
            motor_count: 1,
        }
    }
}

impl CouplingConfig {
    fn validate(&self) -> PowertrainResult<()> {
        ensure_finite(self.ambient_c, "ambient temperature [°C]")?;
        ensure_positive(self.temp_tolerance_c, "temperature tolerance [°C]")?;
        ensure_positive(self.voltage_tolerance_v, "voltage tolerance [V]")?;
        ensure_positive(self.motor_r_thermal_c_per_w, "motor thermal resistance [°C/W]")?;
        if self.max_passes == 0 || self.motor_count == 0 {
            return Err(PowertrainError::InvalidInput {
                what: "coupling needs at least one pass and one motor",
            });
        }
        if !(self.voltage_relaxation > 0.0 && self.voltage_relaxation <= 1.0) {
            return Err(PowertrainError::InvalidInput {
                what: "voltage relaxation must be in (0, 1]",
            });
        }
        Ok(())
    }

    fn motor_body(&self) -> PowertrainResult<ThermalMass> {
        Ok(ThermalMass::new(
            self.motor_mass_g,
            self.motor_specific_heat_j_per_g_c,
            self.motor_r_thermal_c_per_w,
        )?)
    }
}

/// Self-consistent electrical, mechanical and thermal point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoupledPoint {
    /// Per-motor equilibrium at the final pass
    pub equilibrium: EquilibriumPoint,
    pub supply_voltage_v: f64,
    /// Total over all motors [A]
    pub battery_current_a: f64,
    pub battery_power_w: f64,
    pub winding_temp_c: f64,
    /// `None` for a fixed supply
    pub cell_temp_c: Option<f64>,
    /// Per motor [W]
    pub motor_heat_w: f64,
    pub pack_heat_w: f64,
    pub passes: usize,
    /// Terminal voltage under the pack cutoff
    pub below_cutoff: bool,
}

/// One sample of the transient march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransientRecord {
    pub time_s: f64,
    pub winding_temp_c: f64,
    pub cell_temp_c: Option<f64>,
    pub soc_percent: Option<f64>,
    pub supply_voltage_v: f64,
    pub battery_current_a: f64,
    pub rpm: f64,
    pub thrust_n: f64,
}

#[derive(Debug)]
pub struct ThermalCoupling {
    solver: EquilibriumSolver,
    config: CouplingConfig,
    heat: Box<dyn HeatCorrection>,
}

impl ThermalCoupling {
    pub fn new(solver: EquilibriumSolver, config: CouplingConfig) -> Self {
        Self {
            solver,
            config,
            heat: Box::new(JouleOnly),
        }
    }

    /// Replace the pack heat correction (Joule only by default).
    pub fn with_heat_correction(mut self, heat: impl HeatCorrection + 'static) -> Self {
        self.heat = Box::new(heat);
        self
    }

    pub fn config(&self) -> &CouplingConfig {
        &self.config
    }

    pub fn solver(&self) -> &EquilibriumSolver {
        &self.solver
    }

    /// Steady operating point with temperatures at their settled values.
    ///
    /// Each pass solves the equilibrium at the current temperatures and
    /// supply voltage, then moves winding and cell to the steady
    /// temperatures for the resulting heat and the pack voltage toward its
    /// loaded value.
    ///
    /// # Errors
    /// Errors of the inner solve propagate unchanged; `NonConvergence` after
    /// `max_passes`.
    pub fn solve_steady(
        &self,
        motor: &MotorSpec,
        prop: &PropPerformanceSurface,
        supply: Supply<'_>,
        airspeed_ms: f64,
    ) -> PowertrainResult<CoupledPoint> {
        self.config.validate()?;
        let ambient = self.config.ambient_c;
        let motors = self.config.motor_count as f64;
        let pack_r_thermal = match &supply {
            Supply::Pack { pack, .. } => Some(pack.thermal_mass()?.r_thermal_c_per_w),
            Supply::Fixed { .. } => None,
        };

        let mut voltage = supply.open_circuit_voltage()?;
        let mut winding_c = ambient;
        let mut cell_c = ambient;
        let mut last_change = f64::INFINITY;

        for pass in 1..=self.config.max_passes {
            let eq = self.solver.solve(motor, prop, voltage, airspeed_ms, winding_c)?;
            let motor_heat = eq.motor.losses_w();
            let battery_current = motors * eq.motor.current_a.max(0.0);
            let winding_next = steady_state(motor_heat, ambient, self.config.motor_r_thermal_c_per_w)?;

            let (cell_next, voltage_next, pack_heat) = match (&supply, pack_r_thermal) {
                (Supply::Pack { pack, soc_percent }, Some(r_pack)) => {
                    let heat = pack.heat_generation_w(battery_current, *soc_percent, cell_c, self.heat.as_ref())?;
                    let cell_next = steady_state(heat, ambient, r_pack)?;
                    let loaded = pack.loaded_voltage(battery_current, *soc_percent, cell_next)?;
                    (cell_next, loaded, heat)
                }
                _ => (ambient, voltage, 0.0),
            };

            let d_winding = (winding_next - winding_c).abs();
            let d_cell = (cell_next - cell_c).abs();
            let d_voltage = (voltage_next - voltage).abs();
            last_change = d_winding.max(d_cell);
            trace!(pass, voltage, winding_c, cell_c, d_winding, d_cell, d_voltage, "thermal coupling");

            if d_winding < self.config.temp_tolerance_c
                && d_cell < self.config.temp_tolerance_c
                && d_voltage < self.config.voltage_tolerance_v
            {
                let below_cutoff = match &supply {
                    Supply::Pack { pack, .. } => pack.is_below_cutoff(voltage),
                    Supply::Fixed { .. } => false,
                };
                debug!(passes = pass, winding_c = winding_next, cell_c = cell_next, "thermal coupling converged");
                return Ok(CoupledPoint {
                    equilibrium: eq,
                    supply_voltage_v: voltage,
                    battery_current_a: battery_current,
                    battery_power_w: voltage * battery_current,
                    winding_temp_c: winding_next,
                    cell_temp_c: pack_r_thermal.map(|_| cell_next),
                    motor_heat_w: motor_heat,
                    pack_heat_w: pack_heat,
                    passes: pass,
                    below_cutoff,
                });
            }

            winding_c = winding_next;
            cell_c = cell_next;
            voltage = relax(voltage, voltage_next, self.config.voltage_relaxation);
        }

        warn!(passes = self.config.max_passes, last_change, "thermal coupling did not converge");
        Err(PowertrainError::NonConvergence {
            what: "thermal coupling",
            iterations: self.config.max_passes,
            last_change,
        })
    }

    /// March winding and cell temperatures through time.
    ///
    /// One equilibrium solve per step at the held temperatures; heat is then
    /// integrated with [`ThermalState::step_body`]. A pack supply discharges
    /// and its voltage follows the loaded value with the configured
    /// relaxation. Stops at `duration_s` or when the pack is empty.
    ///
    /// # Errors
    /// `InvalidInput` for a non-positive step, a negative duration, or more
    /// than [`MAX_MARCH_STEPS`] steps; errors of the inner solve propagate.
    pub fn simulate(
        &self,
        motor: &MotorSpec,
        prop: &PropPerformanceSurface,
        supply: Supply<'_>,
        airspeed_ms: f64,
        duration_s: f64,
        dt_s: f64,
    ) -> PowertrainResult<Vec<TransientRecord>> {
        self.config.validate()?;
        ensure_non_negative(duration_s, "duration [s]")?;
        ensure_positive(dt_s, "time step [s]")?;
        let steps = (duration_s / dt_s).ceil();
        if !steps.is_finite() || steps > MAX_MARCH_STEPS as f64 {
            return Err(PowertrainError::InvalidInput {
                what: "transient march needs too many steps for its duration",
            });
        }
        let ambient = self.config.ambient_c;
        let motors = self.config.motor_count as f64;
        let motor_body = self.config.motor_body()?;

        let pack = match &supply {
            Supply::Pack { pack, soc_percent } => Some((*pack, pack.thermal_mass()?, *soc_percent)),
            Supply::Fixed { .. } => None,
        };
        let mut soc = pack.as_ref().map(|(_, _, soc)| *soc);
        let mut voltage = supply.open_circuit_voltage()?;
        let mut winding = ThermalState::at_ambient(ambient)?;
        let mut cell = ThermalState::at_ambient(ambient)?;

        let mut records = Vec::with_capacity((steps as usize + 1).min(4096));
        loop {
            let eq = self.solver.solve(motor, prop, voltage, airspeed_ms, winding.temp_c())?;
            let current = motors * eq.motor.current_a.max(0.0);
            records.push(TransientRecord {
                time_s: winding.time_s(),
                winding_temp_c: winding.temp_c(),
                cell_temp_c: pack.as_ref().map(|_| cell.temp_c()),
                soc_percent: soc,
                supply_voltage_v: voltage,
                battery_current_a: current,
                rpm: eq.rpm(),
                thrust_n: eq.thrust_n,
            });

            let remaining = duration_s - winding.time_s();
            if remaining <= 1e-9 * dt_s {
                break;
            }
            let h = dt_s.min(remaining);
            winding.step_body(eq.motor.losses_w(), ambient, h, &motor_body)?;

            if let (Some((pack, body, _)), Some(soc_now)) = (pack.as_ref(), soc) {
                let heat = pack.heat_generation_w(current, soc_now, cell.temp_c(), self.heat.as_ref())?;
                cell.step_body(heat, ambient, h, body)?;

                let used_percent = 100.0 * current * h / 3600.0 / (pack.capacity_mah() / 1000.0);
                let soc_next = (soc_now - used_percent).max(0.0);
                soc = Some(soc_next);
                if soc_next <= 0.0 {
                    warn!(time_s = winding.time_s(), "pack depleted during march");
                    break;
                }
                let loaded = pack.loaded_voltage(current, soc_next, cell.temp_c())?;
                voltage = relax(voltage, loaded, self.config.voltage_relaxation);
            }
        }

        debug!(records = records.len(), "transient march finished");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        let bad = CouplingConfig {
            motor_count: 0,
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(PowertrainError::InvalidInput { .. })));
        let bad = CouplingConfig {
            voltage_relaxation: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(CouplingConfig::default().validate().is_ok());
    }

    #[test]
    fn fixed_supply_voltage() {
        let s = Supply::Fixed { voltage_v: 14.8 };
        assert_eq!(s.open_circuit_voltage().unwrap(), 14.8);
        assert!(Supply::Fixed { voltage_v: 0.0 }.open_circuit_voltage().is_err());
    }
}
