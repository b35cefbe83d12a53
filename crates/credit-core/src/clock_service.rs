//! Simulation clock control routed through the gateway.

use chrono::{DateTime, Utc};
use credit_domain::{Period, SimulationClock};
use tracing::info;

use crate::{time::Clock, CoreError, LedgerGateway};

pub struct ClockService;

impl ClockService {
    /// Fresh clock state: midnight of the wall-clock day, `offset_years` ahead.
    pub fn initial_state(wall: &dyn Clock, offset_years: u32) -> Result<SimulationClock, CoreError> {
        Ok(SimulationClock::starting_from(wall.now(), offset_years)?)
    }

    pub fn current(gateway: &dyn LedgerGateway) -> Result<DateTime<Utc>, CoreError> {
        Ok(gateway.current_instant()?)
    }

    pub fn advance(gateway: &dyn LedgerGateway, period: Period) -> Result<DateTime<Utc>, CoreError> {
        let mut clock = gateway.clock_state()?;
        let instant = clock.advance(period)?;
        gateway.set_current_instant(instant)?;
        info!(period = %period, now = %instant, "clock advanced");
        Ok(instant)
    }

    pub fn reverse(gateway: &dyn LedgerGateway, period: Period) -> Result<DateTime<Utc>, CoreError> {
        let mut clock = gateway.clock_state()?;
        let instant = clock.reverse(period)?;
        gateway.set_current_instant(instant)?;
        info!(period = %period, now = %instant, "clock reversed");
        Ok(instant)
    }

    pub fn reset(gateway: &dyn LedgerGateway) -> Result<DateTime<Utc>, CoreError> {
        let instant = gateway.reset_instant()?;
        info!(now = %instant, "clock reset");
        Ok(instant)
    }
}
