//! Equivalent-circuit solves for a BLDC motor.
//!
//! ```text
//! Rm     = Rm_ref · (1 + α · (T_w − T_ref))
//! V_bemf = rpm / kv
//! I      = (V − V_bemf) / Rm
//! I0     = I0_ref · (rpm / rpm_ref)^0.5
//! τ      = (I − I0) · Kt · f_corr(I)          Kt = 30 / (π · kv)
//! ```
//!
//! At fixed supply voltage `τ(rpm)` is strictly decreasing, so the inverse
//! problem (speed for a load torque) has at most one root and a damped
//! Newton step on the linear part of the model contracts toward it.

use crate::correction::{KtCorrection, LinearMagnetics};
use crate::error::{MotorError, MotorResult};
use crate::point::OperatingPoint;
use crate::spec::MotorSpec;
use pt_core::units::rpm_to_rad_per_s;
use pt_core::{ensure_finite, ensure_non_negative, ensure_positive};
use tracing::{debug, trace, warn};

/// Fixed-point passes [`MotorCircuitModel::current_from_torque`] makes before giving up.
pub const CURRENT_ITERATIONS: usize = 50;

/// Inverse-solve configuration.
#[derive(Clone, Copy, Debug)]
pub struct MotorSolveConfig {
    /// Maximum RPM updates
    pub max_iterations: usize,
    /// Converged when successive RPM guesses differ by less than this [RPM]
    pub rpm_tolerance: f64,
    /// Fraction of the Newton step applied each iteration, in (0, 1]
    pub damping: f64,
    /// Converged points above `overload_margin · i_max` are infeasible
    pub overload_margin: f64,
    /// Initial guess as a fraction of no-load speed
    pub seed_fraction: f64,
}

impl Default for MotorSolveConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            rpm_tolerance: 1.0,
            damping: 0.7,
            overload_margin: 1.5,
            seed_fraction: 0.8,
        }
    }
}

impl MotorSolveConfig {
    fn validate(&self) -> MotorResult<()> {
        if self.max_iterations == 0 {
            return Err(MotorError::InvalidInput {
                what: "motor solve needs at least one iteration",
            });
        }
        ensure_positive(self.rpm_tolerance, "motor rpm tolerance")?;
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(MotorError::InvalidInput {
                what: "motor solve damping must be in (0, 1]",
            });
        }
        ensure_positive(self.overload_margin, "overload margin")?;
        if !(self.seed_fraction > 0.0 && self.seed_fraction <= 1.0) {
            return Err(MotorError::InvalidInput {
                what: "seed fraction must be in (0, 1]",
            });
        }
        Ok(())
    }
}

/// Characteristic points at a supply voltage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorLimits {
    /// `kv · V` [RPM]
    pub no_load_rpm: f64,
    /// `V / Rm` [A]
    pub stall_current_a: f64,
    /// Torque at zero speed [N·m]
    pub stall_torque_nm: f64,
    /// Torque at the continuous current rating and zero speed [N·m]
    pub rated_torque_nm: f64,
    /// Continuous power rating [W]
    pub max_power_w: f64,
}

/// Direct and inverse equivalent-circuit solves.
///
/// Holds the torque-constant correction; motor records are passed per call
/// so one model can be shared across threads and motors.
#[derive(Debug)]
pub struct MotorCircuitModel {
    correction: Box<dyn KtCorrection>,
}

impl Default for MotorCircuitModel {
    fn default() -> Self {
        Self::new(LinearMagnetics)
    }
}

impl MotorCircuitModel {
    pub fn new(correction: impl KtCorrection + 'static) -> Self {
        Self {
            correction: Box::new(correction),
        }
    }

    /// Effective torque constant at a winding current [N·m/A].
    pub fn kt_effective(&self, motor: &MotorSpec, current_a: f64, winding_temp_c: f64) -> f64 {
        motor.kt_nm_per_a() * self.correction.factor(current_a, motor.i_max_a, winding_temp_c)
    }

    /// Operating point at a known speed and supply voltage.
    ///
    /// # Errors
    /// `InvalidInput` for negative speed or voltage, non-finite inputs, or a
    /// winding temperature outside the copper model.
    pub fn state_at_rpm(&self, motor: &MotorSpec, v_supply: f64, rpm: f64, winding_temp_c: f64) -> MotorResult<OperatingPoint> {
        ensure_non_negative(v_supply, "supply voltage [V]")?;
        ensure_non_negative(rpm, "motor speed [RPM]")?;
        let rm = motor.winding_resistance(winding_temp_c)?;

        let back_emf_v = rpm / motor.kv_rpm_per_v;
        let current_a = (v_supply - back_emf_v) / rm;
        let no_load_current_a = motor.no_load_current(rpm);
        let torque_nm = (current_a - no_load_current_a) * self.kt_effective(motor, current_a, winding_temp_c);

        Ok(self.assemble(
            motor,
            rpm,
            current_a,
            torque_nm,
            v_supply,
            back_emf_v,
            no_load_current_a,
            rm,
            winding_temp_c,
        ))
    }

    /// Operating point holding `rpm` against `torque_nm`; the terminal
    /// voltage is whatever the circuit requires.
    ///
    /// Used when speed and load are both known (propeller-driven cruise,
    /// efficiency maps) and the controller sets the voltage.
    pub fn state_for_load(&self, motor: &MotorSpec, rpm: f64, torque_nm: f64, winding_temp_c: f64) -> MotorResult<OperatingPoint> {
        ensure_non_negative(rpm, "motor speed [RPM]")?;
        ensure_finite(torque_nm, "load torque [N·m]")?;
        let rm = motor.winding_resistance(winding_temp_c)?;

        let back_emf_v = rpm / motor.kv_rpm_per_v;
        let no_load_current_a = motor.no_load_current(rpm);
        let current_a = self.current_from_torque(motor, torque_nm, rpm, winding_temp_c)?;
        let voltage_v = back_emf_v + current_a * rm;

        Ok(self.assemble(
            motor,
            rpm,
            current_a,
            torque_nm,
            voltage_v,
            back_emf_v,
            no_load_current_a,
            rm,
            winding_temp_c,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        motor: &MotorSpec,
        rpm: f64,
        current_a: f64,
        torque_nm: f64,
        voltage_v: f64,
        back_emf_v: f64,
        no_load_current_a: f64,
        rm: f64,
        winding_temp_c: f64,
    ) -> OperatingPoint {
        let mechanical_power_w = torque_nm * rpm_to_rad_per_s(rpm);
        let electrical_power_w = voltage_v * current_a;
        let efficiency = if electrical_power_w > 0.0 {
            (mechanical_power_w / electrical_power_w).max(0.0)
        } else {
            0.0
        };

        OperatingPoint {
            rpm,
            current_a,
            torque_nm,
            voltage_v,
            electrical_power_w,
            mechanical_power_w,
            efficiency,
            copper_loss_w: current_a * current_a * rm,
            iron_loss_w: no_load_current_a * back_emf_v,
            back_emf_v,
            no_load_current_a,
            winding_resistance_ohm: rm,
            winding_temp_c,
            valid: (0.0..=motor.i_max_a).contains(&current_a),
        }
    }

    /// Speed at which motor torque equals `torque_load` for a supply voltage.
    ///
    /// Seeds at `seed_fraction · kv · V`, then applies damped Newton steps
    /// using `∂τ/∂rpm ≈ −Kt / (Rm · kv)`, clamped to `[0, kv · V]`.
    ///
    /// # Errors
    /// - `Infeasible` when the load exceeds stall torque, or the converged
    ///   current exceeds `overload_margin · i_max`
    /// - `NonConvergence` when the RPM update is still above tolerance after
    ///   `max_iterations`
    /// - `InvalidInput` for non-positive voltage or negative load
    pub fn solve_operating_point(
        &self,
        motor: &MotorSpec,
        v_supply: f64,
        torque_load: f64,
        winding_temp_c: f64,
        config: &MotorSolveConfig,
    ) -> MotorResult<OperatingPoint> {
        config.validate()?;
        ensure_positive(v_supply, "supply voltage [V]")?;
        ensure_non_negative(torque_load, "load torque [N·m]")?;
        let rm = motor.winding_resistance(winding_temp_c)?;

        let stall_torque = self.stall_torque(motor, v_supply, rm, winding_temp_c);
        if torque_load > stall_torque {
            return Err(MotorError::Infeasible {
                what: "load torque exceeds stall torque",
                requested: torque_load,
                available: stall_torque,
            });
        }

        let rpm_max = motor.no_load_rpm(v_supply);
        let slope = -motor.kt_nm_per_a() / (rm * motor.kv_rpm_per_v);
        let mut rpm = config.seed_fraction * rpm_max;
        let mut step = f64::INFINITY;

        for iter in 1..=config.max_iterations {
            let point = self.state_at_rpm(motor, v_supply, rpm, winding_temp_c)?;
            let error = point.torque_nm - torque_load;
            let next = (rpm - config.damping * error / slope).clamp(0.0, rpm_max);
            step = next - rpm;
            trace!(iter, rpm, torque = point.torque_nm, error, step, "motor solve");

            if step.abs() < config.rpm_tolerance {
                let solved = self.state_at_rpm(motor, v_supply, next, winding_temp_c)?;
                let current_limit = config.overload_margin * motor.i_max_a;
                if solved.current_a > current_limit {
                    return Err(MotorError::Infeasible {
                        what: "load current exceeds overload margin",
                        requested: solved.current_a,
                        available: current_limit,
                    });
                }
                debug!(
                    iterations = iter,
                    rpm = solved.rpm,
                    current_a = solved.current_a,
                    "motor operating point converged"
                );
                return Ok(solved);
            }
            rpm = next;
        }

        warn!(
            iterations = config.max_iterations,
            rpm,
            step,
            "motor operating point did not converge"
        );
        Err(MotorError::NonConvergence {
            what: "motor speed [RPM]",
            iterations: config.max_iterations,
            last: rpm,
            last_step: step,
        })
    }

    fn stall_torque(&self, motor: &MotorSpec, v_supply: f64, rm: f64, winding_temp_c: f64) -> f64 {
        let stall_current = v_supply / rm;
        stall_current * self.kt_effective(motor, stall_current, winding_temp_c)
    }

    /// Torque at the continuous current rating [N·m].
    ///
    /// Zero when the no-load current at this speed already exceeds the rating.
    pub fn max_torque_at_rpm(&self, motor: &MotorSpec, rpm: f64, winding_temp_c: f64) -> MotorResult<f64> {
        ensure_non_negative(rpm, "motor speed [RPM]")?;
        ensure_finite(winding_temp_c, "winding temperature [°C]")?;
        let torque_current = (motor.i_max_a - motor.no_load_current(rpm)).max(0.0);
        Ok(torque_current * self.kt_effective(motor, motor.i_max_a, winding_temp_c))
    }

    /// Winding current needed to deliver `torque_nm` at `rpm` [A].
    ///
    /// `I = τ / Kt_eff(I) + I0`; fixed-point iterated when a correction
    /// makes `Kt` current dependent.
    ///
    /// # Errors
    /// `NonConvergence` when the current update is still above 1e-9 A after
    /// [`CURRENT_ITERATIONS`] passes.
    pub fn current_from_torque(&self, motor: &MotorSpec, torque_nm: f64, rpm: f64, winding_temp_c: f64) -> MotorResult<f64> {
        ensure_finite(torque_nm, "torque [N·m]")?;
        ensure_non_negative(rpm, "motor speed [RPM]")?;
        let i0 = motor.no_load_current(rpm);
        let mut current = torque_nm / motor.kt_nm_per_a() + i0;
        let mut step = f64::INFINITY;
        for _ in 0..CURRENT_ITERATIONS {
            let next = torque_nm / self.kt_effective(motor, current, winding_temp_c) + i0;
            step = next - current;
            if step.abs() < 1e-9 {
                return Ok(next);
            }
            current = next;
        }

        warn!(current, step, "torque-to-current iteration did not converge");
        Err(MotorError::NonConvergence {
            what: "winding current [A]",
            iterations: CURRENT_ITERATIONS,
            last: current,
            last_step: step,
        })
    }

    /// Shaft torque for a winding current [N·m].
    pub fn torque_from_current(&self, motor: &MotorSpec, current_a: f64, rpm: f64, winding_temp_c: f64) -> MotorResult<f64> {
        ensure_finite(current_a, "current [A]")?;
        ensure_non_negative(rpm, "motor speed [RPM]")?;
        let i0 = motor.no_load_current(rpm);
        Ok((current_a - i0) * self.kt_effective(motor, current_a, winding_temp_c))
    }

    /// Characteristic points at a supply voltage.
    pub fn limits(&self, motor: &MotorSpec, v_supply: f64, winding_temp_c: f64) -> MotorResult<MotorLimits> {
        ensure_positive(v_supply, "supply voltage [V]")?;
        let rm = motor.winding_resistance(winding_temp_c)?;
        Ok(MotorLimits {
            no_load_rpm: motor.no_load_rpm(v_supply),
            stall_current_a: v_supply / rm,
            stall_torque_nm: self.stall_torque(motor, v_supply, rm, winding_temp_c),
            rated_torque_nm: self.max_torque_at_rpm(motor, 0.0, winding_temp_c)?,
            max_power_w: motor.p_max_w,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::QuadraticSaturation;

    fn motor() -> MotorSpec {
        MotorSpec::new("test", 1000.0, 0.020, 2.0, 10_000.0, 50.0, 800.0).unwrap()
    }

    #[test]
    fn state_at_rpm_formulas() {
        let model = MotorCircuitModel::default();
        let p = model.state_at_rpm(&motor(), 14.8, 14_000.0, 25.0).unwrap();
        assert!((p.back_emf_v - 14.0).abs() < 1e-12);
        assert!((p.current_a - 40.0).abs() < 1e-9);
        let i0 = 2.0 * 1.4f64.sqrt();
        assert!((p.no_load_current_a - i0).abs() < 1e-12);
        let kt = 30.0 / (std::f64::consts::PI * 1000.0);
        assert!((p.torque_nm - (40.0 - i0) * kt).abs() < 1e-12);
        assert!((p.electrical_power_w - 14.8 * 40.0).abs() < 1e-9);
        assert!((p.copper_loss_w - 32.0).abs() < 1e-9);
        assert!((p.iron_loss_w - i0 * 14.0).abs() < 1e-12);
        assert!(p.valid);
        // Losses account for the whole difference
        assert!((p.electrical_power_w - p.mechanical_power_w - p.losses_w()).abs() < 1e-9);
    }

    #[test]
    fn generator_region_is_invalid_with_zero_efficiency() {
        let model = MotorCircuitModel::default();
        let p = model.state_at_rpm(&motor(), 14.8, 15_000.0, 25.0).unwrap();
        assert!(p.current_a < 0.0);
        assert!(!p.valid);
        assert_eq!(p.efficiency, 0.0);
    }

    #[test]
    fn overcurrent_is_flagged_not_rejected() {
        let model = MotorCircuitModel::default();
        let p = model.state_at_rpm(&motor(), 14.8, 5_000.0, 25.0).unwrap();
        assert!(p.current_a > 50.0);
        assert!(!p.valid);
    }

    #[test]
    fn state_at_rpm_rejects_negative_speed() {
        let model = MotorCircuitModel::default();
        assert!(model.state_at_rpm(&motor(), 14.8, -1.0, 25.0).is_err());
        assert!(model.state_at_rpm(&motor(), f64::NAN, 1.0, 25.0).is_err());
    }

    #[test]
    fn solve_matches_load() {
        let model = MotorCircuitModel::default();
        let p = model
            .solve_operating_point(&motor(), 14.8, 0.30, 25.0, &MotorSolveConfig::default())
            .unwrap();
        assert!((p.rpm - 14_124.0).abs() < 5.0);
        assert!((p.current_a - 33.8).abs() < 0.1);
        assert!((p.torque_nm - 0.30).abs() < 1e-3);
        assert!(p.valid);
    }

    #[test]
    fn stall_torque_exceeded_is_infeasible() {
        let model = MotorCircuitModel::default();
        // Stall torque at 14.8 V: 740 A · Kt ≈ 7.07 N·m
        let err = model
            .solve_operating_point(&motor(), 14.8, 8.0, 25.0, &MotorSolveConfig::default())
            .unwrap_err();
        assert!(matches!(err, MotorError::Infeasible { what: "load torque exceeds stall torque", .. }));
    }

    #[test]
    fn overload_is_infeasible() {
        let model = MotorCircuitModel::default();
        // 1.0 N·m needs ≈ 107 A > 75 A
        let err = model
            .solve_operating_point(&motor(), 14.8, 1.0, 25.0, &MotorSolveConfig::default())
            .unwrap_err();
        assert!(matches!(err, MotorError::Infeasible { what: "load current exceeds overload margin", .. }));
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let model = MotorCircuitModel::default();
        let config = MotorSolveConfig {
            max_iterations: 2,
            ..MotorSolveConfig::default()
        };
        let err = model.solve_operating_point(&motor(), 14.8, 0.30, 25.0, &config).unwrap_err();
        assert!(matches!(err, MotorError::NonConvergence { iterations: 2, .. }));
    }

    #[test]
    fn zero_load_spins_near_no_load_speed() {
        let model = MotorCircuitModel::default();
        let p = model
            .solve_operating_point(&motor(), 14.8, 0.0, 25.0, &MotorSolveConfig::default())
            .unwrap();
        assert!(p.rpm < 14_800.0);
        assert!((p.current_a - p.no_load_current_a).abs() < 0.1);
    }

    #[test]
    fn max_torque_at_rpm_uses_rating() {
        let model = MotorCircuitModel::default();
        let m = motor();
        let t = model.max_torque_at_rpm(&m, 10_000.0, 25.0).unwrap();
        assert!((t - 48.0 * m.kt_nm_per_a()).abs() < 1e-12);
    }

    #[test]
    fn current_torque_inverse_pair() {
        let model = MotorCircuitModel::new(QuadraticSaturation::new(0.05).unwrap());
        let m = motor();
        let i = model.current_from_torque(&m, 0.4, 12_000.0, 25.0).unwrap();
        let t = model.torque_from_current(&m, i, 12_000.0, 25.0).unwrap();
        assert!((t - 0.4).abs() < 1e-8);
    }

    /// Kt halves below a threshold current, so the fixed point flips
    /// between two currents forever.
    #[derive(Debug)]
    struct FlippingKt {
        threshold_a: f64,
    }

    impl KtCorrection for FlippingKt {
        fn factor(&self, current_a: f64, _i_max_a: f64, _winding_temp_c: f64) -> f64 {
            if current_a < self.threshold_a { 0.5 } else { 1.0 }
        }
    }

    #[test]
    fn current_from_torque_reports_non_convergence() {
        let m = motor();
        let base = 0.4 / m.kt_nm_per_a() + m.no_load_current(12_000.0);
        let model = MotorCircuitModel::new(FlippingKt {
            threshold_a: base + 0.2 / m.kt_nm_per_a(),
        });
        let err = model.current_from_torque(&m, 0.4, 12_000.0, 25.0).unwrap_err();
        match err {
            MotorError::NonConvergence {
                what,
                iterations,
                last_step,
                ..
            } => {
                assert_eq!(what, "winding current [A]");
                assert_eq!(iterations, CURRENT_ITERATIONS);
                assert!(last_step.abs() > 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn state_for_load_reports_required_voltage() {
        let model = MotorCircuitModel::default();
        let m = motor();
        let direct = model.state_at_rpm(&m, 14.8, 14_000.0, 25.0).unwrap();
        let inverse = model.state_for_load(&m, 14_000.0, direct.torque_nm, 25.0).unwrap();
        assert!((inverse.voltage_v - 14.8).abs() < 1e-9);
        assert!((inverse.current_a - direct.current_a).abs() < 1e-9);
    }

    #[test]
    fn saturation_lowers_torque() {
        let linear = MotorCircuitModel::default();
        let saturated = MotorCircuitModel::new(QuadraticSaturation::new(0.05).unwrap());
        let m = motor();
        let a = linear.state_at_rpm(&m, 14.8, 14_000.0, 25.0).unwrap();
        let b = saturated.state_at_rpm(&m, 14.8, 14_000.0, 25.0).unwrap();
        assert!(b.torque_nm < a.torque_nm);
        assert_eq!(a.current_a, b.current_a);
    }

    #[test]
    fn limits() {
        let model = MotorCircuitModel::default();
        let m = motor();
        let l = model.limits(&m, 14.8, 25.0).unwrap();
        assert!((l.no_load_rpm - 14_800.0).abs() < 1e-9);
        assert!((l.stall_current_a - 740.0).abs() < 1e-9);
        assert!((l.stall_torque_nm - 740.0 * m.kt_nm_per_a()).abs() < 1e-9);
        assert!((l.rated_torque_nm - 50.0 * m.kt_nm_per_a()).abs() < 1e-12);
    }
}
