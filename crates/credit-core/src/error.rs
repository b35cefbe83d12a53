use credit_domain::{DomainError, PlayerId};
use thiserror::Error;

use crate::GatewayError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Validation failed: {0}")]
    Validation(String),
}
