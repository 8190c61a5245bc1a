//! Lumped-capacitance thermal node.
//!
//! ```text
//! C · dT/dt = P_heat − (T − T_ambient) / R_th        C = m · Cp
//! τ = C · R_th
//! ```
//!
//! ## Integration
//!
//! `step` uses explicit Euler. For a step `h` the error amplification is
//! `1 − h/τ`, so the scheme is stable for `h < 2τ` and free of overshoot for
//! `h ≤ τ`. Steps longer than `MAX_SUBSTEP_FRACTION · τ` are split into equal
//! substeps, at most `MAX_SUBSTEPS` of them, so `dt_s` may be up to
//! `MAX_SUBSTEPS · MAX_SUBSTEP_FRACTION · τ`. Longer steps are rejected.

use crate::environment::ThermalEnvironment;
use crate::error::{ThermalError, ThermalResult};
use pt_core::{ensure_finite, ensure_non_negative, ensure_positive};

/// Largest explicit Euler substep as a fraction of the time constant.
pub const MAX_SUBSTEP_FRACTION: f64 = 0.5;

/// Most substeps one call to [`ThermalState::step_body`] will take.
pub const MAX_SUBSTEPS: usize = 100_000;

/// Heat capacity and coupling to ambient of one body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalMass {
    /// Mass [g]
    pub mass_g: f64,
    /// Specific heat [J/(g·°C)]
    pub specific_heat_j_per_g_c: f64,
    /// Thermal resistance to ambient [°C/W]
    pub r_thermal_c_per_w: f64,
}

impl ThermalMass {
    /// # Errors
    /// `InvalidInput` for non-positive mass, specific heat or thermal resistance.
    pub fn new(mass_g: f64, specific_heat_j_per_g_c: f64, r_thermal_c_per_w: f64) -> ThermalResult<Self> {
        ensure_positive(mass_g, "thermal mass [g]")?;
        ensure_positive(specific_heat_j_per_g_c, "specific heat [J/(g·°C)]")?;
        ensure_positive(r_thermal_c_per_w, "thermal resistance [°C/W]")?;
        Ok(Self {
            mass_g,
            specific_heat_j_per_g_c,
            r_thermal_c_per_w,
        })
    }

    /// Same body, resistance taken from a cooling environment.
    pub fn in_environment(mass_g: f64, specific_heat_j_per_g_c: f64, env: ThermalEnvironment) -> ThermalResult<Self> {
        Self::new(mass_g, specific_heat_j_per_g_c, env.r_thermal_c_per_w())
    }

    /// Heat capacity [J/°C].
    pub fn heat_capacity_j_per_c(&self) -> f64 {
        self.mass_g * self.specific_heat_j_per_g_c
    }

    /// τ = m·Cp·R_th [s].
    pub fn time_constant_s(&self) -> f64 {
        self.heat_capacity_j_per_c() * self.r_thermal_c_per_w
    }

    /// Largest single explicit Euler step that does not diverge [s].
    pub fn max_stable_dt_s(&self) -> f64 {
        2.0 * self.time_constant_s()
    }

    /// Steady temperature under constant heat [°C].
    pub fn steady_state_c(&self, heat_w: f64, ambient_c: f64) -> f64 {
        ambient_c + heat_w * self.r_thermal_c_per_w
    }

    /// Heat [W] that holds the body exactly at `max_temp_c`.
    ///
    /// Zero when ambient is already at or above the limit.
    pub fn max_heat_for_temperature(&self, max_temp_c: f64, ambient_c: f64) -> f64 {
        ((max_temp_c - ambient_c) / self.r_thermal_c_per_w).max(0.0)
    }

    /// Time [s] to go from `start_c` to `target_c` under constant heat.
    ///
    /// ```text
    /// t = −τ · ln((T_ss − T_target) / (T_ss − T_start))
    /// ```
    ///
    /// `None` when the target lies on the far side of (or exactly at) the
    /// steady temperature, i.e. it is never reached.
    pub fn time_to_temperature(&self, start_c: f64, target_c: f64, heat_w: f64, ambient_c: f64) -> Option<f64> {
        if target_c == start_c {
            return Some(0.0);
        }
        let t_ss = self.steady_state_c(heat_w, ambient_c);
        let ratio = (t_ss - target_c) / (t_ss - start_c);
        if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
            return None;
        }
        Some(-self.time_constant_s() * ratio.ln())
    }
}

/// Closed-form steady temperature `T_ambient + P_heat · R_th` [°C].
///
/// # Errors
/// `InvalidInput` for a negative or non-finite resistance or non-finite inputs.
pub fn steady_state(heat_w: f64, ambient_c: f64, r_thermal: f64) -> ThermalResult<f64> {
    ensure_finite(heat_w, "heat [W]")?;
    ensure_finite(ambient_c, "ambient temperature [°C]")?;
    ensure_non_negative(r_thermal, "thermal resistance [°C/W]")?;
    Ok(ambient_c + heat_w * r_thermal)
}

/// Temperature history of one simulated body.
///
/// Created at simulation start, mutated only by [`ThermalState::step`], and
/// not shared between concurrent solves.
#[derive(Clone, Debug, PartialEq)]
pub struct ThermalState {
    temp_c: f64,
    ambient_c: f64,
    time_s: f64,
    last_heat_w: f64,
    last_dissipation_w: f64,
}

impl ThermalState {
    /// Start at an explicit temperature.
    pub fn new(initial_temp_c: f64, ambient_c: f64) -> ThermalResult<Self> {
        ensure_finite(initial_temp_c, "initial temperature [°C]")?;
        ensure_finite(ambient_c, "ambient temperature [°C]")?;
        Ok(Self {
            temp_c: initial_temp_c,
            ambient_c,
            time_s: 0.0,
            last_heat_w: 0.0,
            last_dissipation_w: 0.0,
        })
    }

    /// Start in equilibrium with ambient.
    pub fn at_ambient(ambient_c: f64) -> ThermalResult<Self> {
        Self::new(ambient_c, ambient_c)
    }

    pub fn temp_c(&self) -> f64 {
        self.temp_c
    }

    pub fn ambient_c(&self) -> f64 {
        self.ambient_c
    }

    /// Accumulated simulated time [s].
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Heat input during the last step [W].
    pub fn last_heat_w(&self) -> f64 {
        self.last_heat_w
    }

    /// Heat rejected to ambient at the end of the last step [W].
    pub fn last_dissipation_w(&self) -> f64 {
        self.last_dissipation_w
    }

    /// Advance by `dt_s` with constant heat input and return the new temperature.
    ///
    /// # Errors
    /// `InvalidInput` for non-positive mass, specific heat or resistance,
    /// negative `dt_s`, or non-finite inputs. State is unchanged on error.
    pub fn step(
        &mut self,
        heat_w: f64,
        ambient_c: f64,
        dt_s: f64,
        mass_g: f64,
        specific_heat: f64,
        r_thermal: f64,
    ) -> ThermalResult<f64> {
        let body = ThermalMass::new(mass_g, specific_heat, r_thermal)?;
        self.step_body(heat_w, ambient_c, dt_s, &body)
    }

    /// [`ThermalState::step`] with a prevalidated body.
    pub fn step_body(&mut self, heat_w: f64, ambient_c: f64, dt_s: f64, body: &ThermalMass) -> ThermalResult<f64> {
        ensure_finite(heat_w, "heat [W]")?;
        ensure_finite(ambient_c, "ambient temperature [°C]")?;
        ensure_non_negative(dt_s, "time step [s]")?;

        let tau = body.time_constant_s();
        let capacity = body.heat_capacity_j_per_c();
        let max_substep = MAX_SUBSTEP_FRACTION * tau;
        let substeps = (dt_s / max_substep).ceil().max(1.0);
        if !substeps.is_finite() || substeps > MAX_SUBSTEPS as f64 {
            return Err(ThermalError::InvalidInput {
                what: "time step too large for thermal time constant",
            });
        }
        let h = dt_s / substeps;

        let mut t = self.temp_c;
        for _ in 0..substeps as usize {
            let dissipation = (t - ambient_c) / body.r_thermal_c_per_w;
            t += h * (heat_w - dissipation) / capacity;
        }

        self.temp_c = t;
        self.ambient_c = ambient_c;
        self.time_s += dt_s;
        self.last_heat_w = heat_w;
        self.last_dissipation_w = (t - ambient_c) / body.r_thermal_c_per_w;
        Ok(t)
    }

    /// Steady temperature for the held ambient; does not mutate.
    pub fn steady_state(&self, heat_w: f64, r_thermal: f64) -> ThermalResult<f64> {
        steady_state(heat_w, self.ambient_c, r_thermal)
    }
}
