//! credit-core
//!
//! Ledger services and the persistence gateway contract.
//! Depends on credit-domain. No CLI, no terminal I/O, no file formats.

pub mod clock_service;
pub mod error;
pub mod forecast_service;
pub mod gateway;
pub mod ledger_service;
pub mod memory_gateway;
pub mod payment_service;
pub mod player_service;
pub mod time;

pub use clock_service::*;
pub use error::CoreError;
pub use forecast_service::*;
pub use gateway::{GatewayError, GatewayState, LedgerGateway, Subscription, Topic};
pub use ledger_service::*;
pub use memory_gateway::MemoryGateway;
pub use payment_service::*;
pub use player_service::*;
pub use time::{Clock, FixedClock, SystemClock};

#[cfg(test)]
mod tests;
