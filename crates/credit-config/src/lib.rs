//! credit-config
//!
//! Persistent tracker preferences: forecast horizon, projection window,
//! clock offset and data location.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::{ConfigManager, CONFIG_DIR, CONFIG_FILE};
pub use model::Config;
