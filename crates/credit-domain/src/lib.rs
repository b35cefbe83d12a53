//! credit-domain
//!
//! Core data model for the credit ledger: money values, recurring payment
//! rules, scheduled payments, ledger entries, players and the simulation clock.
//! Pure data plus pure functions. No persistence, no logging.

pub mod clock;
pub mod credits;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod payment;
pub mod period;
pub mod player;

pub use clock::SimulationClock;
pub use credits::Credits;
pub use entry::{LedgerEntry, TimelineEntry};
pub use error::DomainError;
pub use ledger::{Identifiable, Ledger};
pub use payment::{RecurringPayment, ScheduledPayment};
pub use period::{Period, PeriodUnit};
pub use player::{Player, PlayerId};
