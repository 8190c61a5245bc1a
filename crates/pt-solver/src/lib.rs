//! pt-solver: coupled powertrain operating points.
//!
//! Ties a motor and a propeller surface into one equilibrium where motor
//! torque equals propeller load torque, optionally closing the loop through
//! winding and cell temperatures and a battery pack's loaded voltage.
//!
//! Contains:
//! - equilibrium (motor ↔ propeller fixed point)
//! - coupling (steady thermal coupling and transient thermal march)
//! - cruise (required-thrust solve with throttle and battery totals)
//! - sweep (parallel airspeed / throttle evaluations)

pub mod coupling;
pub mod cruise;
pub mod equilibrium;
pub mod error;
pub mod sweep;

pub use coupling::{CoupledPoint, CouplingConfig, MAX_MARCH_STEPS, Supply, ThermalCoupling, TransientRecord};
pub use cruise::{CruisePoint, CruiseSolver};
pub use equilibrium::{EquilibriumConfig, EquilibriumPoint, EquilibriumSolver};
pub use error::{ErrorKind, PowertrainError, PowertrainResult};
pub use sweep::{SweepPoint, airspeed_sweep, cruise_sweep, grid_sweep, throttle_sweep};
