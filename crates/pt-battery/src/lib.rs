//! pt-battery: equivalent-circuit cell and pack model.
//!
//! Open-circuit voltage from per-chemistry anchor tables, internal resistance
//! with multiplicative temperature and SOC corrections, loaded voltage, pack
//! aggregation, runtime estimates and continuous current/power limits.
//! Everything here is a pure function of its inputs.

pub mod cell;
pub mod chemistry;
pub mod error;
pub mod limits;
pub mod pack;

pub use cell::{CellSpec, IrCorrection, internal_resistance, loaded_voltage};
pub use chemistry::Chemistry;
pub use error::{BatteryError, BatteryResult};
pub use limits::{
    CurrentLimit, LimitingFactor, PowerLimit, c_rate_at_current, current_at_c_rate, max_continuous_current,
    max_continuous_power,
};
pub use pack::{MAX_PARALLEL, MAX_SERIES, PEUKERT_EXPONENT, PackConfig};
