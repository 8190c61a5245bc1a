//! Powertrain solve errors.

use pt_battery::BatteryError;
use pt_core::CoreError;
use pt_motor::MotorError;
use pt_prop::PropError;
use pt_thermal::ThermalError;
use std::fmt;
use thiserror::Error;

pub type PowertrainResult<T> = Result<T, PowertrainError>;

/// Outcome families callers branch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input outside a documented domain
    InvalidInput,
    /// Propeller query outside the sampled data
    OutOfEnvelope,
    /// Valid request the hardware cannot meet
    Infeasible,
    /// Iteration budget or deadline exhausted
    NonConvergence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::OutOfEnvelope => write!(f, "out of envelope"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::NonConvergence => write!(f, "non-convergence"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowertrainError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    #[error("Infeasible: {what} (requested {requested}, available {available})")]
    Infeasible {
        what: &'static str,
        requested: f64,
        available: f64,
    },

    #[error("{what} did not converge after {iterations} iterations (last change {last_change})")]
    NonConvergence {
        what: &'static str,
        iterations: usize,
        last_change: f64,
    },

    #[error("Deadline passed after {iterations} outer iterations")]
    DeadlineExceeded { iterations: usize },

    #[error("Motor: {0}")]
    Motor(#[from] MotorError),

    #[error("Propeller: {0}")]
    Prop(#[from] PropError),

    #[error("Battery: {0}")]
    Battery(#[from] BatteryError),

    #[error("Thermal: {0}")]
    Thermal(#[from] ThermalError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PowertrainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::Core(_) | Self::Thermal(_) => ErrorKind::InvalidInput,
            Self::Infeasible { .. } => ErrorKind::Infeasible,
            Self::NonConvergence { .. } | Self::DeadlineExceeded { .. } => ErrorKind::NonConvergence,
            Self::Motor(e) => match e {
                MotorError::Infeasible { .. } => ErrorKind::Infeasible,
                MotorError::NonConvergence { .. } => ErrorKind::NonConvergence,
                MotorError::InvalidInput { .. } | MotorError::Core(_) => ErrorKind::InvalidInput,
            },
            Self::Prop(e) => match e {
                PropError::OutOfEnvelope { .. }
                | PropError::AirspeedOutOfEnvelope { .. }
                | PropError::BelowEnvelope { .. } => ErrorKind::OutOfEnvelope,
                PropError::Infeasible { .. } => ErrorKind::Infeasible,
                PropError::NonConvergence { .. } => ErrorKind::NonConvergence,
                PropError::EmptySamples
                | PropError::Degenerate { .. }
                | PropError::InvalidInput { .. }
                | PropError::Core(_) => ErrorKind::InvalidInput,
            },
            Self::Battery(e) => match e {
                BatteryError::Infeasible { .. } => ErrorKind::Infeasible,
                BatteryError::InvalidInput { .. } | BatteryError::Core(_) | BatteryError::Thermal(_) => {
                    ErrorKind::InvalidInput
                }
            },
        }
    }
}
