//! Motor efficiency map over a speed × torque grid.
//!
//! Every cell is an independent `state_for_load` evaluation, so the grid is
//! computed in parallel with rayon.

use crate::circuit::MotorCircuitModel;
use crate::error::{MotorError, MotorResult};
use crate::point::OperatingPoint;
use crate::spec::MotorSpec;
use pt_core::sweep::linspace;
use rayon::prelude::*;

/// One grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapCell {
    pub rpm: f64,
    pub torque_nm: f64,
    /// `None` when the supply cannot reach this point or the current
    /// exceeds the continuous rating
    pub point: Option<OperatingPoint>,
}

impl MapCell {
    pub fn efficiency(&self) -> Option<f64> {
        self.point.map(|p| p.efficiency)
    }
}

#[derive(Clone, Debug)]
pub struct EfficiencyMap {
    pub v_supply: f64,
    pub winding_temp_c: f64,
    pub rpm_values: Vec<f64>,
    pub torque_values: Vec<f64>,
    /// Row-major: `cells[i_rpm * torque_values.len() + i_torque]`
    cells: Vec<MapCell>,
}

impl EfficiencyMap {
    /// Evaluate the map on explicit axes.
    pub fn compute(
        model: &MotorCircuitModel,
        motor: &MotorSpec,
        v_supply: f64,
        winding_temp_c: f64,
        rpm_values: Vec<f64>,
        torque_values: Vec<f64>,
    ) -> MotorResult<Self> {
        if rpm_values.is_empty() || torque_values.is_empty() {
            return Err(MotorError::InvalidInput {
                what: "efficiency map axes must be non-empty",
            });
        }
        let n_torque = torque_values.len();

        let cells = (0..rpm_values.len() * n_torque)
            .into_par_iter()
            .map(|k| {
                let rpm = rpm_values[k / n_torque];
                let torque_nm = torque_values[k % n_torque];
                let point = model.state_for_load(motor, rpm, torque_nm, winding_temp_c)?;
                let reachable = point.valid && point.voltage_v <= v_supply;
                Ok(MapCell {
                    rpm,
                    torque_nm,
                    point: reachable.then_some(point),
                })
            })
            .collect::<MotorResult<Vec<_>>>()?;

        Ok(Self {
            v_supply,
            winding_temp_c,
            rpm_values,
            torque_values,
            cells,
        })
    }

    /// Standard grid: speed 10–95 % of no-load, torque 5–90 % of rated.
    pub fn default_grid(
        model: &MotorCircuitModel,
        motor: &MotorSpec,
        v_supply: f64,
        winding_temp_c: f64,
        n_rpm: usize,
        n_torque: usize,
    ) -> MotorResult<Self> {
        let limits = model.limits(motor, v_supply, winding_temp_c)?;
        let rpm_values = linspace(0.10 * limits.no_load_rpm, 0.95 * limits.no_load_rpm, n_rpm);
        let torque_values = linspace(0.05 * limits.rated_torque_nm, 0.90 * limits.rated_torque_nm, n_torque);
        Self::compute(model, motor, v_supply, winding_temp_c, rpm_values, torque_values)
    }

    pub fn get(&self, i_rpm: usize, i_torque: usize) -> Option<&MapCell> {
        if i_torque >= self.torque_values.len() {
            return None;
        }
        self.cells.get(i_rpm * self.torque_values.len() + i_torque)
    }

    pub fn cells(&self) -> &[MapCell] {
        &self.cells
    }

    pub fn reachable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.point.is_some()).count()
    }

    /// Highest-efficiency reachable cell.
    pub fn best(&self) -> Option<&MapCell> {
        self.cells
            .iter()
            .filter(|c| c.point.is_some())
            .max_by(|a, b| a.efficiency().partial_cmp(&b.efficiency()).unwrap_or(std::cmp::Ordering::Equal))
    }
}
