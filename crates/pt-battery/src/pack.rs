//! Series/parallel pack built from one cell type.

use crate::cell::{CellSpec, loaded_voltage};
use crate::error::{BatteryError, BatteryResult};
use pt_core::units::{Energy, Voltage, volts, watt_hours};
use pt_core::{BrentConfig, brent, ensure_finite, ensure_in_range, ensure_non_negative};
use pt_thermal::{HeatCorrection, ThermalMass};

/// Largest supported series count.
pub const MAX_SERIES: u32 = 12;
/// Largest supported parallel count.
pub const MAX_PARALLEL: u32 = 8;
/// Peukert exponent for lithium-ion cells.
pub const PEUKERT_EXPONENT: f64 = 1.05;

/// `S`-series, `P`-parallel arrangement of a borrowed [`CellSpec`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackConfig<'a> {
    cell: &'a CellSpec,
    series: u32,
    parallel: u32,
}

impl<'a> PackConfig<'a> {
    /// # Errors
    /// `InvalidInput` when `series ∉ [1, 12]`, `parallel ∉ [1, 8]`, or the
    /// cell record violates its invariants.
    pub fn new(cell: &'a CellSpec, series: u32, parallel: u32) -> BatteryResult<Self> {
        if !(1..=MAX_SERIES).contains(&series) {
            return Err(BatteryError::InvalidInput {
                what: "series count must be in [1, 12]",
            });
        }
        if !(1..=MAX_PARALLEL).contains(&parallel) {
            return Err(BatteryError::InvalidInput {
                what: "parallel count must be in [1, 8]",
            });
        }
        cell.validate()?;
        Ok(Self { cell, series, parallel })
    }

    pub fn cell(&self) -> &'a CellSpec {
        self.cell
    }

    pub fn series(&self) -> u32 {
        self.series
    }

    pub fn parallel(&self) -> u32 {
        self.parallel
    }

    pub fn cell_count(&self) -> u32 {
        self.series * self.parallel
    }

    /// Conventional `6S2P` label.
    pub fn label(&self) -> String {
        format!("{}S{}P", self.series, self.parallel)
    }

    pub fn nominal_voltage_v(&self) -> f64 {
        self.series as f64 * self.cell.nominal_voltage_v
    }

    pub fn nominal_voltage(&self) -> Voltage {
        volts(self.nominal_voltage_v())
    }

    pub fn max_voltage_v(&self) -> f64 {
        self.series as f64 * self.cell.max_voltage_v
    }

    /// Pack cutoff voltage [V].
    pub fn min_voltage_v(&self) -> f64 {
        self.series as f64 * self.cell.min_voltage_v
    }

    pub fn capacity_mah(&self) -> f64 {
        self.parallel as f64 * self.cell.capacity_mah
    }

    pub fn energy_wh(&self) -> f64 {
        self.nominal_voltage_v() * self.capacity_mah() / 1000.0
    }

    pub fn energy(&self) -> Energy {
        watt_hours(self.energy_wh())
    }

    pub fn mass_g(&self) -> f64 {
        self.cell_count() as f64 * self.cell.mass_g
    }

    /// Pack open-circuit voltage [V].
    pub fn open_circuit_voltage(&self, soc_percent: f64) -> BatteryResult<f64> {
        Ok(self.series as f64 * self.cell.ocv(soc_percent)?)
    }

    /// `S · IR_cell / P` [Ω].
    pub fn resistance_ohm(&self, temp_c: f64, soc_percent: f64) -> BatteryResult<f64> {
        let ir_cell = self.cell.internal_resistance(temp_c, soc_percent)?;
        Ok(self.series as f64 * ir_cell / self.parallel as f64)
    }

    /// Terminal voltage under a total discharge current [V].
    pub fn loaded_voltage(&self, current_a: f64, soc_percent: f64, temp_c: f64) -> BatteryResult<f64> {
        let ocv = self.cell.ocv(soc_percent)?;
        let ir_cell = self.cell.internal_resistance(temp_c, soc_percent)?;
        let v_cell = loaded_voltage(ocv, current_a, self.parallel, ir_cell)?;
        Ok(self.series as f64 * v_cell)
    }

    /// `I · R_pack` [V].
    pub fn voltage_sag(&self, current_a: f64, soc_percent: f64, temp_c: f64) -> BatteryResult<f64> {
        ensure_non_negative(current_a, "discharge current [A]")?;
        Ok(current_a * self.resistance_ohm(temp_c, soc_percent)?)
    }

    /// True when a terminal voltage is under the pack cutoff.
    pub fn is_below_cutoff(&self, terminal_voltage_v: f64) -> bool {
        terminal_voltage_v < self.min_voltage_v()
    }

    /// Heat generated inside the pack [W].
    pub fn heat_generation_w(
        &self,
        current_a: f64,
        soc_percent: f64,
        temp_c: f64,
        correction: &dyn HeatCorrection,
    ) -> BatteryResult<f64> {
        ensure_non_negative(current_a, "discharge current [A]")?;
        let r = self.resistance_ohm(temp_c, soc_percent)?;
        Ok(correction.apply(current_a * current_a * r))
    }

    /// Discharge current [A] that delivers `power_w` at the terminals.
    ///
    /// Smaller root of `P = (V_oc − I·R)·I`.
    ///
    /// # Errors
    /// `Infeasible` when `power_w` exceeds the matched-load maximum `V_oc² / 4R`.
    pub fn current_for_power(&self, power_w: f64, soc_percent: f64, temp_c: f64) -> BatteryResult<f64> {
        ensure_non_negative(power_w, "electrical power [W]")?;
        let v_oc = self.open_circuit_voltage(soc_percent)?;
        let r = self.resistance_ohm(temp_c, soc_percent)?;
        let disc = v_oc * v_oc - 4.0 * r * power_w;
        if disc < 0.0 {
            return Err(BatteryError::Infeasible {
                what: "pack power above matched-load maximum",
                requested: power_w,
                available: v_oc * v_oc / (4.0 * r),
            });
        }
        // Rationalized form, well behaved as R → 0
        let current = 2.0 * power_w / (v_oc + disc.sqrt());
        Ok(ensure_finite(current, "pack current [A]")?)
    }

    /// Capacity [mAh] available at a constant discharge current.
    ///
    /// Above 1C the capacity shrinks by `(1 / C)^(k − 1)` with the Peukert
    /// exponent `k`; at or below 1C it is the rated capacity.
    pub fn effective_capacity_mah(&self, current_a: f64) -> BatteryResult<f64> {
        ensure_non_negative(current_a, "discharge current [A]")?;
        let rated = self.capacity_mah();
        let c_rate = current_a / (rated / 1000.0);
        if c_rate > 1.0 {
            Ok(rated * c_rate.recip().powf(PEUKERT_EXPONENT - 1.0))
        } else {
            Ok(rated)
        }
    }

    /// SOC [%] at which the loaded voltage falls to the pack cutoff.
    ///
    /// 0 when the pack holds above cutoff all the way down, 100 when it is
    /// already below cutoff when full.
    pub fn end_soc(&self, current_a: f64, temp_c: f64) -> BatteryResult<f64> {
        let cutoff_v = self.min_voltage_v();
        let margin = |soc: f64| -> BatteryResult<f64> { Ok(self.loaded_voltage(current_a, soc, temp_c)? - cutoff_v) };
        if margin(0.0)? > 0.0 {
            return Ok(0.0);
        }
        if margin(100.0)? <= 0.0 {
            return Ok(100.0);
        }
        let config = BrentConfig {
            max_iterations: 100,
            x_rel_tol: 1e-9,
            x_abs_tol: 1e-9,
        };
        Ok(brent(margin, 0.0, 100.0, &config)?.root)
    }

    /// Capacity [mAh] drawn between `start_soc` and the cutoff SOC.
    fn usable_capacity_mah(&self, current_a: f64, start_soc: f64, temp_c: f64) -> BatteryResult<(f64, f64)> {
        ensure_in_range(start_soc, 0.0, 100.0, "start state of charge [%]")?;
        let end = self.end_soc(current_a, temp_c)?.min(start_soc);
        let capacity = self.effective_capacity_mah(current_a)? * (start_soc - end) / 100.0;
        Ok((capacity, end))
    }

    /// Energy [Wh] delivered at a constant current from `start_soc` to cutoff.
    ///
    /// Average terminal voltage is taken at the SOC midpoint of the discharge.
    pub fn usable_energy_wh(&self, current_a: f64, start_soc: f64, temp_c: f64) -> BatteryResult<f64> {
        let (capacity_mah, end) = self.usable_capacity_mah(current_a, start_soc, temp_c)?;
        let avg_v = self.loaded_voltage(current_a, 0.5 * (start_soc + end), temp_c)?;
        Ok(capacity_mah / 1000.0 * avg_v)
    }

    /// Minutes of constant-current discharge from `start_soc` to cutoff.
    ///
    /// Infinite at zero current.
    pub fn runtime_min(&self, current_a: f64, start_soc: f64, temp_c: f64) -> BatteryResult<f64> {
        let (capacity_mah, _) = self.usable_capacity_mah(current_a, start_soc, temp_c)?;
        if current_a == 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok(capacity_mah / 1000.0 / current_a * 60.0)
    }

    /// Lumped thermal body of the whole pack.
    ///
    /// Cells exchange heat with ambient in parallel, so the pack resistance
    /// is the cell resistance divided by the cell count.
    pub fn thermal_mass(&self) -> BatteryResult<ThermalMass> {
        let n = self.cell_count() as f64;
        Ok(ThermalMass::new(
            self.mass_g(),
            self.cell.specific_heat_j_per_g_c,
            self.cell.r_thermal_c_per_w / n,
        )?)
    }
}
