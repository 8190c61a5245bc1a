//! pt-motor: brushless DC motor equivalent circuit.
//!
//! Contains:
//! - `MotorSpec` (datasheet record)
//! - `OperatingPoint` (immutable per-query result)
//! - `MotorCircuitModel` (direct solve at a known RPM, inverse solve at a
//!   known load torque, limits)
//! - torque-constant correction hooks
//! - parallel efficiency map evaluation

pub mod circuit;
pub mod correction;
pub mod error;
pub mod map;
pub mod point;
pub mod spec;

pub use circuit::{CURRENT_ITERATIONS, MotorCircuitModel, MotorLimits, MotorSolveConfig};
pub use correction::{KtCorrection, LinearMagnetics, QuadraticSaturation};
pub use error::{MotorError, MotorResult};
pub use map::{EfficiencyMap, MapCell};
pub use point::OperatingPoint;
pub use spec::MotorSpec;
