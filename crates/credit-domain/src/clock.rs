//! Simulated "now" shared by every session of a campaign.

use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Period};

/// Current and original simulated instants.
///
/// `original` is the instant the clock was first initialized at and the
/// target of [`SimulationClock::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationClock {
    pub current: DateTime<Utc>,
    pub original: DateTime<Utc>,
}

impl SimulationClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: start,
            original: start,
        }
    }

    /// Start of the day of `now`, shifted `offset_years` into the future.
    pub fn starting_from(now: DateTime<Utc>, offset_years: u32) -> Result<Self, DomainError> {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or(DomainError::InstantOutOfRange)?;
        let start = midnight
            .checked_add_months(Months::new(offset_years.saturating_mul(12)))
            .ok_or(DomainError::InstantOutOfRange)?;
        Ok(Self::new(start))
    }

    pub fn current(&self) -> DateTime<Utc> {
        self.current
    }

    pub fn original(&self) -> DateTime<Utc> {
        self.original
    }

    pub fn set_current(&mut self, instant: DateTime<Utc>) {
        self.current = instant;
    }

    pub fn advance(&mut self, period: Period) -> Result<DateTime<Utc>, DomainError> {
        self.current = period
            .checked_add_to(self.current)
            .ok_or(DomainError::InstantOutOfRange)?;
        Ok(self.current)
    }

    pub fn reverse(&mut self, period: Period) -> Result<DateTime<Utc>, DomainError> {
        self.current = period
            .checked_sub_from(self.current)
            .ok_or(DomainError::InstantOutOfRange)?;
        Ok(self.current)
    }

    pub fn reset(&mut self) -> DateTime<Utc> {
        self.current = self.original;
        self.current
    }
}
