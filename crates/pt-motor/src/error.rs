//! Motor model errors.

use pt_core::CoreError;
use thiserror::Error;

pub type MotorResult<T> = Result<T, MotorError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotorError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    /// No operating point exists for the request; the inputs themselves are fine.
    #[error("Infeasible: {what} (requested {requested}, available {available})")]
    Infeasible {
        what: &'static str,
        requested: f64,
        available: f64,
    },

    /// An iteration hit its cap; `last` and `last_step` are in the units of `what`.
    #[error("{what} did not converge after {iterations} iterations (last {last}, last step {last_step})")]
    NonConvergence {
        what: &'static str,
        iterations: usize,
        last: f64,
        last_step: f64,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MotorError::NonConvergence {
            what: "motor speed [RPM]",
            iterations: 20,
            last: 14_000.0,
            last_step: 3.5,
        };
        assert!(err.to_string().starts_with("motor speed [RPM] did not converge after 20 iterations"));

        let err = MotorError::Infeasible {
            what: "load torque exceeds stall torque",
            requested: 2.0,
            available: 7.0,
        };
        assert!(err.to_string().starts_with("Infeasible"));
    }
}
