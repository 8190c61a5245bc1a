use pt_core::CoreError;
use thiserror::Error;

pub type ThermalResult<T> = Result<T, ThermalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermalError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}
