use pt_core::units::{AngularSpeed, Current, Power, Torque, Voltage, amps, newton_meters, rpm, volts, watts};

/// Snapshot of the motor at one electrical/mechanical operating point.
///
/// Produced per query and never updated afterwards. `valid` is false when
/// the winding current is negative (back-EMF above supply) or above the
/// continuous rating; such points are still returned for inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperatingPoint {
    /// Shaft speed [RPM]
    pub rpm: f64,
    /// Winding current [A]
    pub current_a: f64,
    /// Shaft torque [N·m]
    pub torque_nm: f64,
    /// Terminal voltage [V]
    pub voltage_v: f64,
    /// `V · I` [W]
    pub electrical_power_w: f64,
    /// `τ · ω` [W]
    pub mechanical_power_w: f64,
    /// `P_mech / P_elec`, zero when no power flows in or the torque current is negative
    pub efficiency: f64,
    /// `I² · Rm` [W]
    pub copper_loss_w: f64,
    /// `I0 · V_bemf` [W]
    pub iron_loss_w: f64,
    /// `rpm / kv` [V]
    pub back_emf_v: f64,
    /// Speed-dependent no-load current [A]
    pub no_load_current_a: f64,
    /// Winding resistance used [Ω]
    pub winding_resistance_ohm: f64,
    /// Winding temperature used [°C]
    pub winding_temp_c: f64,
    pub valid: bool,
}

impl OperatingPoint {
    /// Heat generated in the motor [W].
    pub fn losses_w(&self) -> f64 {
        self.copper_loss_w + self.iron_loss_w
    }

    /// Steady winding temperature if all losses leave through `r_thermal_c_per_w` [°C].
    pub fn winding_temp_estimate_c(&self, ambient_c: f64, r_thermal_c_per_w: f64) -> f64 {
        ambient_c + self.losses_w() * r_thermal_c_per_w
    }

    pub fn shaft_speed(&self) -> AngularSpeed {
        rpm(self.rpm)
    }

    pub fn current(&self) -> Current {
        amps(self.current_a)
    }

    pub fn torque(&self) -> Torque {
        newton_meters(self.torque_nm)
    }

    pub fn voltage(&self) -> Voltage {
        volts(self.voltage_v)
    }

    pub fn electrical_power(&self) -> Power {
        watts(self.electrical_power_w)
    }

    pub fn mechanical_power(&self) -> Power {
        watts(self.mechanical_power_w)
    }
}
