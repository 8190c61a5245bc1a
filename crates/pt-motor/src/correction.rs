//! Torque-constant correction hooks.
//!
//! The baseline model uses linear magnetics (`Kt` independent of current).
//! Saturation and magnet temperature effects are opt-in through
//! [`KtCorrection`].

use crate::error::{MotorError, MotorResult};
use std::fmt;

/// Multiplier on the ideal torque constant.
pub trait KtCorrection: fmt::Debug + Send + Sync {
    /// Factor in `(0, 1]` applied to `Kt` at a winding current.
    fn factor(&self, current_a: f64, i_max_a: f64, winding_temp_c: f64) -> f64;
}

/// Ideal linear magnetics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinearMagnetics;

impl KtCorrection for LinearMagnetics {
    fn factor(&self, _current_a: f64, _i_max_a: f64, _winding_temp_c: f64) -> f64 {
        1.0
    }
}

/// Quadratic saturation roll-off.
///
/// ```text
/// factor = clamp(1 − c · (I / I_max)², 0.8, 1.0)
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadraticSaturation {
    coeff: f64,
}

impl QuadraticSaturation {
    pub const MIN_FACTOR: f64 = 0.8;
    /// Largest accepted coefficient.
    pub const MAX_COEFF: f64 = 0.2;

    pub fn new(coeff: f64) -> MotorResult<Self> {
        if !coeff.is_finite() || !(0.0..=Self::MAX_COEFF).contains(&coeff) {
            return Err(MotorError::InvalidInput {
                what: "saturation coefficient must be in [0, 0.2]",
            });
        }
        Ok(Self { coeff })
    }

    pub fn coeff(&self) -> f64 {
        self.coeff
    }
}

impl KtCorrection for QuadraticSaturation {
    fn factor(&self, current_a: f64, i_max_a: f64, _winding_temp_c: f64) -> f64 {
        let x = current_a / i_max_a;
        (1.0 - self.coeff * x * x).clamp(Self::MIN_FACTOR, 1.0)
    }
}
