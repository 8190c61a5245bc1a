//! Single-cell electrical model.

use crate::chemistry::Chemistry;
use crate::error::{BatteryError, BatteryResult};
use pt_core::{ensure_finite, ensure_in_range, ensure_non_negative, ensure_positive};

/// Immutable cell datasheet record.
///
/// Invariant: `min_voltage_v < nominal_voltage_v < max_voltage_v`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellSpec {
    pub name: String,
    pub chemistry: Chemistry,
    /// Nominal voltage [V]
    pub nominal_voltage_v: f64,
    /// Fully charged voltage [V]
    pub max_voltage_v: f64,
    /// Discharge cutoff voltage [V]
    pub min_voltage_v: f64,
    /// Rated capacity [mAh]
    pub capacity_mah: f64,
    /// DC internal resistance at the reference temperature and 50 % SOC [Ω]
    pub ir_ref_ohm: f64,
    /// Temperature at which `ir_ref_ohm` was measured [°C]
    pub ref_temp_c: f64,
    /// Thermal resistance cell-to-ambient [°C/W]
    pub r_thermal_c_per_w: f64,
    /// Specific heat [J/(g·°C)]
    pub specific_heat_j_per_g_c: f64,
    /// Cell mass [g]
    pub mass_g: f64,
    /// Maximum continuous discharge current [A]
    pub max_discharge_a: f64,
    /// Maximum operating temperature [°C]
    pub max_temp_c: f64,
}

impl CellSpec {
    /// Cell with the chemistry's voltage window and typical 18650-class
    /// thermal properties.
    pub fn new(name: impl Into<String>, chemistry: Chemistry, capacity_mah: f64, ir_ref_ohm: f64) -> BatteryResult<Self> {
        let (min_v, nominal_v, max_v) = chemistry.voltage_window();
        let spec = Self {
            name: name.into(),
            chemistry,
            nominal_voltage_v: nominal_v,
            max_voltage_v: max_v,
            min_voltage_v: min_v,
            capacity_mah,
            ir_ref_ohm,
            ref_temp_c: 25.0,
            r_thermal_c_per_w: 3.0,
            specific_heat_j_per_g_c: 1.0,
            mass_g: 70.0,
            max_discharge_a: 10.0,
            max_temp_c: 60.0,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_voltages(mut self, min_v: f64, nominal_v: f64, max_v: f64) -> BatteryResult<Self> {
        self.min_voltage_v = min_v;
        self.nominal_voltage_v = nominal_v;
        self.max_voltage_v = max_v;
        self.validate()?;
        Ok(self)
    }

    pub fn with_thermal(mut self, mass_g: f64, specific_heat_j_per_g_c: f64, r_thermal_c_per_w: f64) -> BatteryResult<Self> {
        self.mass_g = mass_g;
        self.specific_heat_j_per_g_c = specific_heat_j_per_g_c;
        self.r_thermal_c_per_w = r_thermal_c_per_w;
        self.validate()?;
        Ok(self)
    }

    pub fn with_limits(mut self, max_discharge_a: f64, max_temp_c: f64) -> BatteryResult<Self> {
        self.max_discharge_a = max_discharge_a;
        self.max_temp_c = max_temp_c;
        self.validate()?;
        Ok(self)
    }

    /// Check the record's invariants.
    pub fn validate(&self) -> BatteryResult<()> {
        ensure_positive(self.min_voltage_v, "cell min voltage [V]")?;
        ensure_finite(self.nominal_voltage_v, "cell nominal voltage [V]")?;
        ensure_finite(self.max_voltage_v, "cell max voltage [V]")?;
        if !(self.min_voltage_v < self.nominal_voltage_v && self.nominal_voltage_v < self.max_voltage_v) {
            return Err(BatteryError::InvalidInput {
                what: "cell voltages must satisfy min < nominal < max",
            });
        }
        ensure_positive(self.capacity_mah, "cell capacity [mAh]")?;
        ensure_non_negative(self.ir_ref_ohm, "cell internal resistance [Ω]")?;
        ensure_finite(self.ref_temp_c, "cell reference temperature [°C]")?;
        ensure_positive(self.r_thermal_c_per_w, "cell thermal resistance [°C/W]")?;
        ensure_positive(self.specific_heat_j_per_g_c, "cell specific heat [J/(g·°C)]")?;
        ensure_positive(self.mass_g, "cell mass [g]")?;
        ensure_positive(self.max_discharge_a, "cell max discharge current [A]")?;
        ensure_finite(self.max_temp_c, "cell max temperature [°C]")?;
        Ok(())
    }

    /// Open-circuit voltage [V].
    pub fn ocv(&self, soc_percent: f64) -> BatteryResult<f64> {
        self.chemistry.ocv(soc_percent)
    }

    /// Internal resistance [Ω] corrected around this cell's reference temperature.
    pub fn internal_resistance(&self, temp_c: f64, soc_percent: f64) -> BatteryResult<f64> {
        let correction = IrCorrection {
            reference_temp_c: self.ref_temp_c,
            ..IrCorrection::default()
        };
        correction.resistance(self.ir_ref_ohm, temp_c, soc_percent)
    }

    /// Stored energy at nominal voltage [Wh].
    pub fn energy_wh(&self) -> f64 {
        self.nominal_voltage_v * self.capacity_mah / 1000.0
    }
}

/// Multiplicative internal-resistance corrections.
///
/// ```text
/// f_T   = max(min_temp_factor, 1 + temp_coeff · (T_ref − T))
/// f_SOC = 1 + soc_penalty · ((SOC − 50) / 50)²
/// IR    = IR_ref · f_T · f_SOC
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IrCorrection {
    /// Calibration temperature [°C]
    pub reference_temp_c: f64,
    /// Fractional change per °C below the reference
    pub temp_coeff_per_c: f64,
    /// Floor on the temperature factor for hot cells
    pub min_temp_factor: f64,
    /// SOC factor at 0 % and 100 % minus one
    pub soc_penalty: f64,
}

impl Default for IrCorrection {
    fn default() -> Self {
        Self {
            reference_temp_c: 25.0,
            temp_coeff_per_c: 0.007,
            min_temp_factor: 0.5,
            soc_penalty: 0.3,
        }
    }
}

impl IrCorrection {
    pub fn temperature_factor(&self, temp_c: f64) -> f64 {
        (1.0 + self.temp_coeff_per_c * (self.reference_temp_c - temp_c)).max(self.min_temp_factor)
    }

    pub fn soc_factor(&self, soc_percent: f64) -> f64 {
        let x = (soc_percent - 50.0) / 50.0;
        1.0 + self.soc_penalty * x * x
    }

    /// Corrected resistance [Ω].
    ///
    /// # Errors
    /// `InvalidInput` for negative `ir_ref`, SOC outside `[0, 100]`, or
    /// non-finite temperature.
    pub fn resistance(&self, ir_ref: f64, temp_c: f64, soc_percent: f64) -> BatteryResult<f64> {
        ensure_non_negative(ir_ref, "reference internal resistance [Ω]")?;
        ensure_finite(temp_c, "cell temperature [°C]")?;
        ensure_in_range(soc_percent, 0.0, 100.0, "state of charge [%]")?;
        Ok(ir_ref * self.temperature_factor(temp_c) * self.soc_factor(soc_percent))
    }
}

/// Internal resistance [Ω] with the default 25 °C calibration.
pub fn internal_resistance(ir_ref: f64, temp_c: f64, soc_percent: f64) -> BatteryResult<f64> {
    IrCorrection::default().resistance(ir_ref, temp_c, soc_percent)
}

/// Terminal voltage [V] of cells sharing `current_total` across `parallel_count` strings.
///
/// `V_oc − (I_total / P) · IR_cell`. Never above `ocv`; not clamped below,
/// callers compare against the cutoff voltage themselves.
///
/// # Errors
/// `InvalidInput` for negative current or resistance, zero parallel count, or
/// non-finite inputs.
pub fn loaded_voltage(ocv: f64, current_total: f64, parallel_count: u32, ir_cell: f64) -> BatteryResult<f64> {
    ensure_finite(ocv, "open-circuit voltage [V]")?;
    ensure_non_negative(current_total, "discharge current [A]")?;
    ensure_non_negative(ir_cell, "cell internal resistance [Ω]")?;
    if parallel_count == 0 {
        return Err(BatteryError::InvalidInput {
            what: "parallel count must be at least 1",
        });
    }
    Ok(ocv - (current_total / parallel_count as f64) * ir_cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_point_is_unmodified() {
        let ir = internal_resistance(0.020, 25.0, 50.0).unwrap();
        assert_eq!(ir, 0.020);
    }

    #[test]
    fn cold_cells_are_more_resistive() {
        let ir_cold = internal_resistance(0.020, 0.0, 50.0).unwrap();
        assert!((ir_cold - 0.020 * 1.175).abs() < 1e-12);
        let ir_hot = internal_resistance(0.020, 45.0, 50.0).unwrap();
        assert!(ir_hot < 0.020);
    }

    #[test]
    fn temperature_factor_floor() {
        let c = IrCorrection::default();
        assert_eq!(c.temperature_factor(200.0), 0.5);
    }

    #[test]
    fn soc_extremes_carry_full_penalty() {
        let at_0 = internal_resistance(0.020, 25.0, 0.0).unwrap();
        let at_100 = internal_resistance(0.020, 25.0, 100.0).unwrap();
        assert!((at_0 - 0.026).abs() < 1e-12);
        assert!((at_100 - 0.026).abs() < 1e-12);
    }

    #[test]
    fn corrections_compose_by_multiplication() {
        let c = IrCorrection::default();
        let ir = c.resistance(0.02, 10.0, 80.0).unwrap();
        let expected = 0.02 * c.temperature_factor(10.0) * c.soc_factor(80.0);
        assert!((ir - expected).abs() < 1e-15);
    }

    #[test]
    fn internal_resistance_rejects_bad_input() {
        assert!(internal_resistance(-0.01, 25.0, 50.0).is_err());
        assert!(internal_resistance(0.01, 25.0, 101.0).is_err());
        assert!(internal_resistance(0.01, f64::INFINITY, 50.0).is_err());
    }

    #[test]
    fn loaded_voltage_sags_by_share_of_current() {
        let v = loaded_voltage(4.0, 20.0, 2, 0.02).unwrap();
        assert!((v - 3.8).abs() < 1e-12);
        assert_eq!(loaded_voltage(4.0, 0.0, 1, 0.02).unwrap(), 4.0);
        assert!(loaded_voltage(4.0, -1.0, 1, 0.02).is_err());
        assert!(loaded_voltage(4.0, 1.0, 0, 0.02).is_err());
    }

    #[test]
    fn loaded_voltage_is_not_clamped() {
        let v = loaded_voltage(3.3, 200.0, 1, 0.02).unwrap();
        assert!(v < 0.0);
    }

    #[test]
    fn cell_spec_invariants() {
        let cell = CellSpec::new("P42A", Chemistry::Nmc, 4200.0, 0.016).unwrap();
        assert!((cell.energy_wh() - 15.12).abs() < 1e-9);
        assert!(cell.clone().with_voltages(3.0, 2.9, 4.2).is_err());
        assert!(cell.clone().with_thermal(-1.0, 1.0, 3.0).is_err());
        assert!(CellSpec::new("bad", Chemistry::Nmc, 0.0, 0.016).is_err());
        assert!(CellSpec::new("bad", Chemistry::Nmc, 3000.0, -0.016).is_err());
    }

    #[test]
    fn cell_uses_own_reference_temperature() {
        let mut cell = CellSpec::new("cold-rated", Chemistry::Lfp, 2500.0, 0.010).unwrap();
        cell.ref_temp_c = 20.0;
        assert_eq!(cell.internal_resistance(20.0, 50.0).unwrap(), 0.010);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn resistance_non_increasing_toward_half_charge(
            temp in -20.0f64..60.0,
            a in 0.0f64..100.0,
            b in 0.0f64..100.0,
        ) {
            // Whichever SOC is closer to 50 % never has the higher resistance.
            let (near, far) = if (a - 50.0).abs() <= (b - 50.0).abs() { (a, b) } else { (b, a) };
            let r_near = internal_resistance(0.02, temp, near).unwrap();
            let r_far = internal_resistance(0.02, temp, far).unwrap();
            prop_assert!(r_near <= r_far + 1e-15);
        }

        #[test]
        fn loaded_voltage_never_exceeds_ocv(
            ocv in 2.5f64..4.3,
            current in 0.0f64..200.0,
            parallel in 1u32..=8,
            ir in 0.0f64..0.1,
        ) {
            let v = loaded_voltage(ocv, current, parallel, ir).unwrap();
            prop_assert!(v <= ocv);
        }
    }
}
