//! Heat-correction hooks.
//!
//! The baseline heat source is pure Joule heating `I²·R`. Refinements such as
//! reversible (entropic) heating are applied through [`HeatCorrection`] so the
//! solvers never assume a magnitude for them.

use crate::error::{ThermalError, ThermalResult};
use std::fmt;

/// Maps Joule heat to total heat generation.
///
/// Implementations must be non-decreasing in `joule_heat_w` and return 0 for 0.
pub trait HeatCorrection: fmt::Debug + Send + Sync {
    /// Total heat [W] for a Joule heat [W].
    fn apply(&self, joule_heat_w: f64) -> f64;
}

/// Joule heating only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JouleOnly;

impl HeatCorrection for JouleOnly {
    fn apply(&self, joule_heat_w: f64) -> f64 {
        joule_heat_w
    }
}

/// Multiplicative entropic-heating allowance.
///
/// Typical lithium-ion values fall in 1.05..=1.15.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntropicFactor {
    factor: f64,
}

impl EntropicFactor {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 1.15;

    pub fn new(factor: f64) -> ThermalResult<Self> {
        if !factor.is_finite() || !(Self::MIN..=Self::MAX).contains(&factor) {
            return Err(ThermalError::InvalidInput {
                what: "entropic factor must be in [1.0, 1.15]",
            });
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl HeatCorrection for EntropicFactor {
    fn apply(&self, joule_heat_w: f64) -> f64 {
        joule_heat_w * self.factor
    }
}
