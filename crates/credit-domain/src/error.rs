use thiserror::Error;

/// Failures raised by pure domain computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid conversion: {0}")]
    InvalidConversion(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Instant out of range")]
    InstantOutOfRange,
}
