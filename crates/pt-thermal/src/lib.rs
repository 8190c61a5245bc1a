//! pt-thermal: lumped single-node thermal models.
//!
//! Provides:
//! - `ThermalMass` (heat capacity + thermal resistance to ambient)
//! - `ThermalState` (temperature history of one cell pack or motor winding)
//! - heat-correction hooks applied on top of Joule heating
//! - named cooling environments

pub mod environment;
pub mod error;
pub mod heat;
pub mod state;

pub use environment::ThermalEnvironment;
pub use error::{ThermalError, ThermalResult};
pub use heat::{EntropicFactor, HeatCorrection, JouleOnly};
pub use state::{ThermalMass, ThermalState, steady_state};
