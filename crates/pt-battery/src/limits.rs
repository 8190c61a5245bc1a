//! Continuous discharge current limits for a pack.

use crate::error::BatteryResult;
use crate::pack::PackConfig;
use pt_core::{BrentConfig, CoreError, brent, ensure_finite, ensure_non_negative};
use pt_thermal::HeatCorrection;
use std::fmt;

/// Which constraint sets the continuous current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitingFactor {
    /// Steady cell temperature reaches `max_temp_c`
    Thermal,
    /// Cell datasheet continuous rating
    Rating,
    /// Terminal voltage reaches the cutoff
    Voltage,
}

impl fmt::Display for LimitingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thermal => write!(f, "thermal"),
            Self::Rating => write!(f, "rating"),
            Self::Voltage => write!(f, "voltage"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentLimit {
    /// Binding pack current [A]
    pub current_a: f64,
    pub limiting: LimitingFactor,
    pub thermal_a: f64,
    pub rating_a: f64,
    pub voltage_a: f64,
}

/// Maximum continuous pack current, the minimum of three limits.
///
/// - thermal: per-cell current whose corrected heat holds the cell at
///   `max_temp_c` in steady state, with IR evaluated at `max_temp_c`, times `P`
/// - rating: `max_discharge_a · P`
/// - voltage: `(V_oc − V_cutoff) / R_pack` at ambient temperature
pub fn max_continuous_current(
    pack: &PackConfig<'_>,
    soc_percent: f64,
    ambient_c: f64,
    correction: &dyn HeatCorrection,
) -> BatteryResult<CurrentLimit> {
    ensure_finite(ambient_c, "ambient temperature [°C]")?;
    let cell = pack.cell();
    let parallel = pack.parallel() as f64;

    let heat_budget_w = ((cell.max_temp_c - ambient_c) / cell.r_thermal_c_per_w).max(0.0);
    let ir_hot = cell.internal_resistance(cell.max_temp_c, soc_percent)?;
    let thermal_a = cell_current_for_heat(heat_budget_w, ir_hot, correction)? * parallel;

    let rating_a = cell.max_discharge_a * parallel;

    let v_oc = pack.open_circuit_voltage(soc_percent)?;
    let r_pack = pack.resistance_ohm(ambient_c, soc_percent)?;
    let headroom_v = (v_oc - pack.min_voltage_v()).max(0.0);
    let voltage_a = if r_pack > 0.0 { headroom_v / r_pack } else { f64::INFINITY };

    let mut limit = CurrentLimit {
        current_a: thermal_a,
        limiting: LimitingFactor::Thermal,
        thermal_a,
        rating_a,
        voltage_a,
    };
    if rating_a < limit.current_a {
        limit.current_a = rating_a;
        limit.limiting = LimitingFactor::Rating;
    }
    if voltage_a < limit.current_a {
        limit.current_a = voltage_a;
        limit.limiting = LimitingFactor::Voltage;
    }
    Ok(limit)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerLimit {
    /// Terminal power at the binding current [W]
    pub power_w: f64,
    pub current_a: f64,
    /// Loaded pack voltage at the binding current [V]
    pub voltage_v: f64,
    pub limiting: LimitingFactor,
}

/// Maximum continuous terminal power, `I_max · V_loaded(I_max)`.
///
/// The loaded voltage is taken with the cells at `max_temp_c`.
pub fn max_continuous_power(
    pack: &PackConfig<'_>,
    soc_percent: f64,
    ambient_c: f64,
    correction: &dyn HeatCorrection,
) -> BatteryResult<PowerLimit> {
    let limit = max_continuous_current(pack, soc_percent, ambient_c, correction)?;
    let voltage_v = pack.loaded_voltage(limit.current_a, soc_percent, pack.cell().max_temp_c)?;
    Ok(PowerLimit {
        power_w: limit.current_a * voltage_v,
        current_a: limit.current_a,
        voltage_v,
        limiting: limit.limiting,
    })
}

/// Pack C-rate at a total discharge current.
pub fn c_rate_at_current(pack: &PackConfig<'_>, current_a: f64) -> BatteryResult<f64> {
    ensure_non_negative(current_a, "discharge current [A]")?;
    Ok(current_a / (pack.capacity_mah() / 1000.0))
}

/// Total discharge current [A] at a pack C-rate.
pub fn current_at_c_rate(pack: &PackConfig<'_>, c_rate: f64) -> BatteryResult<f64> {
    ensure_non_negative(c_rate, "C-rate")?;
    Ok(c_rate * pack.capacity_mah() / 1000.0)
}

/// Cell current [A] whose corrected Joule heat equals `heat_w`.
fn cell_current_for_heat(heat_w: f64, ir_cell: f64, correction: &dyn HeatCorrection) -> BatteryResult<f64> {
    if heat_w <= 0.0 {
        return Ok(0.0);
    }
    if ir_cell <= 0.0 {
        return Ok(f64::INFINITY);
    }

    let residual = |i: f64| Ok::<_, CoreError>(correction.apply(i * i * ir_cell) - heat_w);

    // Joule-only answer, then widen until the corrected heat exceeds the budget
    let mut hi = (heat_w / ir_cell).sqrt();
    for _ in 0..64 {
        if residual(hi)? >= 0.0 {
            break;
        }
        hi *= 2.0;
    }

    let config = BrentConfig {
        max_iterations: 100,
        x_rel_tol: 1e-9,
        x_abs_tol: 1e-12,
    };
    let solution = brent(residual, 0.0, hi, &config)?;
    Ok(solution.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellSpec, Chemistry};
    use pt_thermal::{EntropicFactor, JouleOnly};

    #[test]
    fn thermal_limit_closed_form() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020)
            .unwrap()
            .with_limits(1000.0, 60.0)
            .unwrap();
        let pack = PackConfig::new(&cell, 1, 2).unwrap();
        let limit = max_continuous_current(&pack, 50.0, 25.0, &JouleOnly).unwrap();
        // IR at 60 °C: 0.020 · (1 − 0.007·35) = 0.0151 Ω; budget 35/3 W
        let expected = ((35.0 / 3.0) / 0.0151f64).sqrt() * 2.0;
        assert!((limit.thermal_a - expected).abs() < 1e-6);
    }

    #[test]
    fn entropic_heating_lowers_thermal_limit() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020).unwrap();
        let pack = PackConfig::new(&cell, 1, 1).unwrap();
        let base = max_continuous_current(&pack, 50.0, 25.0, &JouleOnly).unwrap();
        let hook = EntropicFactor::new(1.1).unwrap();
        let corrected = max_continuous_current(&pack, 50.0, 25.0, &hook).unwrap();
        assert!((corrected.thermal_a - base.thermal_a / 1.1f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn rating_binds_for_small_cells() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020)
            .unwrap()
            .with_limits(5.0, 60.0)
            .unwrap();
        let pack = PackConfig::new(&cell, 4, 2).unwrap();
        let limit = max_continuous_current(&pack, 80.0, 25.0, &JouleOnly).unwrap();
        assert_eq!(limit.limiting, LimitingFactor::Rating);
        assert_eq!(limit.current_a, 10.0);
    }

    #[test]
    fn voltage_binds_near_empty() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.200)
            .unwrap()
            .with_limits(100.0, 60.0)
            .unwrap();
        let pack = PackConfig::new(&cell, 1, 1).unwrap();
        let limit = max_continuous_current(&pack, 0.0, 25.0, &JouleOnly).unwrap();
        assert_eq!(limit.limiting, LimitingFactor::Voltage);
        // (3.0 − 2.5) / (0.2 · 1.3)
        assert!((limit.current_a - 0.5 / 0.26).abs() < 1e-9);
    }

    #[test]
    fn hot_ambient_leaves_no_thermal_headroom() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020).unwrap();
        let pack = PackConfig::new(&cell, 1, 1).unwrap();
        let limit = max_continuous_current(&pack, 50.0, 65.0, &JouleOnly).unwrap();
        assert_eq!(limit.current_a, 0.0);
        assert_eq!(limit.limiting, LimitingFactor::Thermal);
    }

    #[test]
    fn power_limit_follows_current_limit() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020)
            .unwrap()
            .with_limits(5.0, 60.0)
            .unwrap();
        let pack = PackConfig::new(&cell, 4, 2).unwrap();
        let power = max_continuous_power(&pack, 80.0, 25.0, &JouleOnly).unwrap();
        assert_eq!(power.limiting, LimitingFactor::Rating);
        assert_eq!(power.current_a, 10.0);
        let v_hot = pack.loaded_voltage(10.0, 80.0, 60.0).unwrap();
        assert_eq!(power.voltage_v, v_hot);
        assert!((power.power_w - 10.0 * v_hot).abs() < 1e-12);
    }

    #[test]
    fn no_thermal_headroom_means_no_power() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020).unwrap();
        let pack = PackConfig::new(&cell, 1, 1).unwrap();
        let power = max_continuous_power(&pack, 50.0, 65.0, &JouleOnly).unwrap();
        assert_eq!(power.power_w, 0.0);
        assert_eq!(power.limiting, LimitingFactor::Thermal);
    }

    #[test]
    fn c_rate_conversions() {
        let cell = CellSpec::new("c", Chemistry::Nmc, 3000.0, 0.020).unwrap();
        let pack = PackConfig::new(&cell, 6, 2).unwrap();
        assert!((c_rate_at_current(&pack, 30.0).unwrap() - 5.0).abs() < 1e-12);
        assert!((current_at_c_rate(&pack, 5.0).unwrap() - 30.0).abs() < 1e-12);
        assert_eq!(c_rate_at_current(&pack, 0.0).unwrap(), 0.0);
        assert!(c_rate_at_current(&pack, -1.0).is_err());
        assert!(current_at_c_rate(&pack, f64::NAN).is_err());
    }
}
