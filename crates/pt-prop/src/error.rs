//! Propeller surface errors.

use pt_core::CoreError;
use thiserror::Error;

pub type PropResult<T> = Result<T, PropError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropError {
    /// Construction with no samples.
    #[error("Propeller surface has no samples")]
    EmptySamples,

    /// Construction with samples that cannot be triangulated.
    #[error("Degenerate propeller samples: {what}")]
    Degenerate { what: &'static str },

    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    #[error("Query outside sampled envelope: airspeed {airspeed_ms} m/s, {rpm} RPM")]
    OutOfEnvelope { airspeed_ms: f64, rpm: f64 },

    #[error("Airspeed {airspeed_ms} m/s outside sampled range [{min}, {max}]")]
    AirspeedOutOfEnvelope { airspeed_ms: f64, min: f64, max: f64 },

    #[error("Required thrust {thrust_required_n} N below the minimum sampled thrust {min_thrust_n} N at {airspeed_ms} m/s")]
    BelowEnvelope {
        airspeed_ms: f64,
        thrust_required_n: f64,
        min_thrust_n: f64,
    },

    #[error("Required thrust {thrust_required_n} N exceeds the maximum {max_thrust_n} N at {airspeed_ms} m/s")]
    Infeasible {
        airspeed_ms: f64,
        thrust_required_n: f64,
        max_thrust_n: f64,
    },

    #[error("Thrust inversion did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PropError {
    /// True for the "query outside sampled data" family.
    pub fn is_out_of_envelope(&self) -> bool {
        matches!(
            self,
            Self::OutOfEnvelope { .. } | Self::AirspeedOutOfEnvelope { .. } | Self::BelowEnvelope { .. }
        )
    }
}
