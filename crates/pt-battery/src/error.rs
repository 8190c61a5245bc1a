use pt_core::CoreError;
use pt_thermal::ThermalError;
use thiserror::Error;

pub type BatteryResult<T> = Result<T, BatteryError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatteryError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    #[error("Infeasible: {what} (requested {requested}, available {available})")]
    Infeasible {
        what: &'static str,
        requested: f64,
        available: f64,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Thermal(#[from] ThermalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BatteryError::Infeasible {
            what: "pack power",
            requested: 2000.0,
            available: 1500.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("pack power"));
        assert!(msg.contains("2000"));
    }

    #[test]
    fn core_errors_pass_through() {
        let err: BatteryError = CoreError::InvalidArg { what: "soc" }.into();
        assert_eq!(err.to_string(), "Invalid argument: soc");
    }
}
