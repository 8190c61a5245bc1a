//! Motor datasheet record.

use crate::error::{MotorError, MotorResult};
use pt_core::{ensure_finite, ensure_non_negative, ensure_positive};
use std::f64::consts::PI;

/// Copper resistance temperature coefficient [1/°C].
pub const COPPER_TEMP_COEFF_PER_C: f64 = 0.00393;

/// No-load current scales with `(rpm / rpm_ref)^NO_LOAD_CURRENT_EXPONENT`.
pub const NO_LOAD_CURRENT_EXPONENT: f64 = 0.5;

/// Immutable BLDC motor parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorSpec {
    pub name: String,
    /// Velocity constant [RPM/V]
    pub kv_rpm_per_v: f64,
    /// Winding resistance at `ref_temp_c` [Ω]
    pub rm_cold_ohm: f64,
    /// No-load current measured at `i0_ref_rpm` [A]
    pub i0_ref_a: f64,
    /// Speed at which `i0_ref_a` was measured [RPM]
    pub i0_ref_rpm: f64,
    /// Maximum continuous current [A]
    pub i_max_a: f64,
    /// Maximum continuous power [W]
    pub p_max_w: f64,
    /// Temperature at which `rm_cold_ohm` was measured [°C]
    pub ref_temp_c: f64,
}

impl MotorSpec {
    /// Motor with a 25 °C resistance reference.
    pub fn new(
        name: impl Into<String>,
        kv_rpm_per_v: f64,
        rm_cold_ohm: f64,
        i0_ref_a: f64,
        i0_ref_rpm: f64,
        i_max_a: f64,
        p_max_w: f64,
    ) -> MotorResult<Self> {
        let spec = Self {
            name: name.into(),
            kv_rpm_per_v,
            rm_cold_ohm,
            i0_ref_a,
            i0_ref_rpm,
            i_max_a,
            p_max_w,
            ref_temp_c: 25.0,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> MotorResult<()> {
        ensure_positive(self.kv_rpm_per_v, "motor kv [RPM/V]")?;
        ensure_positive(self.rm_cold_ohm, "winding resistance [Ω]")?;
        ensure_non_negative(self.i0_ref_a, "no-load current [A]")?;
        ensure_positive(self.i0_ref_rpm, "no-load reference speed [RPM]")?;
        ensure_positive(self.i_max_a, "max continuous current [A]")?;
        ensure_positive(self.p_max_w, "max continuous power [W]")?;
        ensure_finite(self.ref_temp_c, "resistance reference temperature [°C]")?;
        Ok(())
    }

    /// Torque constant `30 / (π · kv)` [N·m/A].
    pub fn kt_nm_per_a(&self) -> f64 {
        30.0 / (PI * self.kv_rpm_per_v)
    }

    /// Winding resistance at temperature [Ω].
    ///
    /// # Errors
    /// `InvalidInput` when the linear copper model goes non-positive.
    pub fn winding_resistance(&self, winding_temp_c: f64) -> MotorResult<f64> {
        ensure_finite(winding_temp_c, "winding temperature [°C]")?;
        let rm = self.rm_cold_ohm * (1.0 + COPPER_TEMP_COEFF_PER_C * (winding_temp_c - self.ref_temp_c));
        if rm <= 0.0 {
            return Err(MotorError::InvalidInput {
                what: "winding temperature below copper model range",
            });
        }
        Ok(rm)
    }

    /// No-load current at speed [A].
    pub fn no_load_current(&self, rpm: f64) -> f64 {
        self.i0_ref_a * (rpm.max(0.0) / self.i0_ref_rpm).powf(NO_LOAD_CURRENT_EXPONENT)
    }

    /// Unloaded speed at a supply voltage [RPM].
    pub fn no_load_rpm(&self, v_supply: f64) -> f64 {
        self.kv_rpm_per_v * v_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor() -> MotorSpec {
        MotorSpec::new("test", 1000.0, 0.020, 2.0, 10_000.0, 50.0, 800.0).unwrap()
    }

    #[test]
    fn kt_from_kv() {
        assert!((motor().kt_nm_per_a() - 0.009_549_296_6).abs() < 1e-9);
    }

    #[test]
    fn copper_resistance_rises_with_temperature() {
        let m = motor();
        assert_eq!(m.winding_resistance(25.0).unwrap(), 0.020);
        let hot = m.winding_resistance(80.0).unwrap();
        assert!((hot - 0.020 * (1.0 + 0.00393 * 55.0)).abs() < 1e-15);
        assert!(m.winding_resistance(-300.0).is_err());
    }

    #[test]
    fn no_load_current_scales_with_sqrt_speed() {
        let m = motor();
        assert_eq!(m.no_load_current(10_000.0), 2.0);
        assert!((m.no_load_current(40_000.0) - 4.0).abs() < 1e-12);
        assert_eq!(m.no_load_current(0.0), 0.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(MotorSpec::new("x", 0.0, 0.02, 2.0, 1e4, 50.0, 800.0).is_err());
        assert!(MotorSpec::new("x", 1000.0, -0.02, 2.0, 1e4, 50.0, 800.0).is_err());
        assert!(MotorSpec::new("x", 1000.0, 0.02, -2.0, 1e4, 50.0, 800.0).is_err());
        assert!(MotorSpec::new("x", 1000.0, 0.02, 2.0, 1e4, 0.0, 800.0).is_err());
    }
}
