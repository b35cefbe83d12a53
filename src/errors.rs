use credit_config::ConfigError;
use credit_core::CoreError;
use credit_domain::DomainError;
use thiserror::Error;

/// Failures surfaced by the session facade and the CLI.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
    #[error("Unknown scheduled payment: {0}")]
    UnknownPayment(String),
    #[error("{0}")]
    Usage(String),
}

impl From<DomainError> for TrackerError {
    fn from(err: DomainError) -> Self {
        TrackerError::Core(CoreError::Domain(err))
    }
}

impl From<credit_core::GatewayError> for TrackerError {
    fn from(err: credit_core::GatewayError) -> Self {
        TrackerError::Core(CoreError::Gateway(err))
    }
}
