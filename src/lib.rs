#![doc(test(attr(deny(warnings))))]

//! Credit Tracker follows each player's in-fiction credits across a simulated
//! clock: one-off entries, recurring payments materialized on demand, and a
//! forecast of when a balance runs dry.

pub mod cli;
pub mod errors;
pub mod session;
pub mod utils;

pub use credit_config as config;
pub use credit_core as core;
pub use credit_domain as domain;
pub use credit_storage_json as storage;

pub use errors::TrackerError;
pub use session::Session;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Credit Tracker tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
