//! Consumer-facing facade over a gateway and the ledger services.
//!
//! A session keeps the most recent snapshot delivered by the gateway's
//! subscriptions. Mutations are forwarded to the gateway and show up locally
//! only after the next [`Session::sync`].

use chrono::{DateTime, Utc};
use credit_core::{
    ClockService, ForecastService, LedgerGateway, LedgerService, PaymentService, PlayerService,
    ProjectionPoint, Subscription, REFERENCE_HORIZON_YEARS,
};
use credit_domain::{
    Credits, Ledger, LedgerEntry, Period, Player, PlayerId, RecurringPayment, ScheduledPayment,
    TimelineEntry,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::TrackerError;

pub struct Session {
    gateway: Box<dyn LedgerGateway>,
    ledger: Ledger,
    entries: Subscription<Vec<LedgerEntry>>,
    payments: Subscription<Vec<ScheduledPayment>>,
    players: Subscription<Vec<Player>>,
    horizon: Period,
}

impl Session {
    /// Subscribes to every collection and loads the primed snapshots.
    pub fn new(gateway: Box<dyn LedgerGateway>) -> Result<Self, TrackerError> {
        let entries = gateway.subscribe_entries();
        let payments = gateway.subscribe_scheduled_payments();
        let players = gateway.subscribe_players();
        let mut session = Self {
            gateway,
            ledger: Ledger::new(),
            entries,
            payments,
            players,
            horizon: Period::years(REFERENCE_HORIZON_YEARS),
        };
        session.sync()?;
        Ok(session)
    }

    /// Forecast look-ahead in years.
    pub fn with_horizon_years(mut self, years: i32) -> Self {
        self.horizon = Period::years(years);
        self
    }

    /// Applies every pending snapshot without blocking and returns how many
    /// arrived. Stream errors are logged; the first one is returned after the
    /// healthy streams have been applied.
    pub fn sync(&mut self) -> Result<usize, TrackerError> {
        let mut applied = 0;
        let mut first_error = None;

        for event in self.entries.drain() {
            match event {
                Ok(entries) => {
                    self.ledger.entries = entries;
                    applied += 1;
                }
                Err(err) => {
                    warn!(error = %err, "entry stream error");
                    first_error.get_or_insert(err);
                }
            }
        }
        for event in self.payments.drain() {
            match event {
                Ok(payments) => {
                    self.ledger.scheduled_payments = payments;
                    applied += 1;
                }
                Err(err) => {
                    warn!(error = %err, "scheduled payment stream error");
                    first_error.get_or_insert(err);
                }
            }
        }
        for event in self.players.drain() {
            match event {
                Ok(players) => {
                    self.ledger.players = players;
                    applied += 1;
                }
                Err(err) => {
                    warn!(error = %err, "player stream error");
                    first_error.get_or_insert(err);
                }
            }
        }

        debug!(applied, "session synced");
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(applied),
        }
    }

    /// Local view as of the last sync.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn gateway(&self) -> &dyn LedgerGateway {
        self.gateway.as_ref()
    }

    pub fn current_instant(&self) -> Result<DateTime<Utc>, TrackerError> {
        Ok(ClockService::current(self.gateway())?)
    }

    fn resolve(&self, instant: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, TrackerError> {
        match instant {
            Some(instant) => Ok(instant),
            None => self.current_instant(),
        }
    }

    /// Resolves a player by case-insensitive name or id.
    pub fn find_player(&self, query: &str) -> Result<&Player, TrackerError> {
        self.ledger
            .find_player(query)
            .ok_or_else(|| TrackerError::UnknownPlayer(query.trim().to_string()))
    }

    pub fn balance_as_of(
        &self,
        player_id: PlayerId,
        instant: Option<DateTime<Utc>>,
    ) -> Result<Credits, TrackerError> {
        let as_of = self.resolve(instant)?;
        Ok(LedgerService::balance_as_of(&self.ledger, player_id, as_of))
    }

    pub fn total_balance(&self, instant: Option<DateTime<Utc>>) -> Result<Credits, TrackerError> {
        let as_of = self.resolve(instant)?;
        Ok(LedgerService::total_balance(&self.ledger, as_of))
    }

    /// Whole days until the player can no longer cover a payment, `None` for never.
    pub fn time_to_insolvency(
        &self,
        player_id: PlayerId,
        instant: Option<DateTime<Utc>>,
    ) -> Result<Option<i64>, TrackerError> {
        let as_of = self.resolve(instant)?;
        Ok(ForecastService::time_to_insolvency_within(
            &self.ledger,
            player_id,
            as_of,
            self.horizon,
        )?)
    }

    pub fn active_scheduled_payments(
        &self,
        player_id: PlayerId,
        instant: Option<DateTime<Utc>>,
    ) -> Result<Vec<&ScheduledPayment>, TrackerError> {
        let as_of = self.resolve(instant)?;
        Ok(LedgerService::active_scheduled_payments(
            &self.ledger,
            player_id,
            as_of,
        ))
    }

    pub fn materialize_virtual_entries(
        &self,
        player_id: PlayerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<TimelineEntry> {
        LedgerService::materialize_virtual_entries(&self.ledger, player_id, start, end)
    }

    pub fn daily_projection(
        &self,
        player_id: PlayerId,
        instant: Option<DateTime<Utc>>,
        days: u32,
    ) -> Result<Vec<ProjectionPoint>, TrackerError> {
        let as_of = self.resolve(instant)?;
        Ok(ForecastService::daily_projection(
            &self.ledger,
            player_id,
            as_of,
            days,
        )?)
    }

    pub fn add_player(&self, name: &str, opening_credits: Credits) -> Result<PlayerId, TrackerError> {
        let now = self.current_instant()?;
        Ok(PlayerService::add_player(
            self.gateway(),
            name,
            opening_credits,
            now,
        )?)
    }

    pub fn remove_player(&self, player_id: PlayerId) -> Result<(), TrackerError> {
        Ok(PlayerService::remove_player(self.gateway(), player_id)?)
    }

    pub fn add_credits(&self, player_id: PlayerId, amount: Credits) -> Result<Uuid, TrackerError> {
        let now = self.current_instant()?;
        Ok(PlayerService::add_credits(
            self.gateway(),
            &self.ledger,
            player_id,
            amount,
            now,
        )?)
    }

    pub fn remove_credits(&self, player_id: PlayerId, amount: Credits) -> Result<Uuid, TrackerError> {
        let now = self.current_instant()?;
        Ok(PlayerService::remove_credits(
            self.gateway(),
            &self.ledger,
            player_id,
            amount,
            now,
        )?)
    }

    pub fn set_credits(
        &self,
        player_id: PlayerId,
        target: Credits,
    ) -> Result<Option<Uuid>, TrackerError> {
        let now = self.current_instant()?;
        Ok(PlayerService::set_credits(
            self.gateway(),
            &self.ledger,
            player_id,
            target,
            now,
        )?)
    }

    /// Splits `total` across every known player.
    pub fn distribute(&self, total: i64) -> Result<Vec<(PlayerId, i64)>, TrackerError> {
        let now = self.current_instant()?;
        let players: Vec<_> = self.ledger.players.iter().map(|player| player.id).collect();
        Ok(PlayerService::distribute_credits(
            self.gateway(),
            &self.ledger,
            &players,
            total,
            now,
        )?)
    }

    /// Schedules a payment starting at `start`, or now when omitted.
    pub fn add_scheduled_payment(
        &self,
        player_id: PlayerId,
        name: &str,
        rule: RecurringPayment,
        start: Option<DateTime<Utc>>,
    ) -> Result<Uuid, TrackerError> {
        let start = self.resolve(start)?;
        Ok(PaymentService::schedule(
            self.gateway(),
            &self.ledger,
            player_id,
            name,
            rule,
            start,
            None,
        )?)
    }

    /// Splits a recurring `total` across every known player, one scheduled
    /// payment per player with a non-zero share.
    pub fn distribute_scheduled_payment(
        &self,
        name: &str,
        total: i64,
        period: Period,
        start: Option<DateTime<Utc>>,
    ) -> Result<Vec<(PlayerId, i64, Uuid)>, TrackerError> {
        let start = self.resolve(start)?;
        let players: Vec<_> = self.ledger.players.iter().map(|player| player.id).collect();
        Ok(PaymentService::schedule_split(
            self.gateway(),
            &self.ledger,
            &players,
            name,
            total,
            period,
            start,
        )?)
    }

    /// Soft delete: the payment stops one day before now. `false` if unknown.
    pub fn end_scheduled_payment(&self, payment_id: Uuid) -> Result<bool, TrackerError> {
        let now = self.current_instant()?;
        Ok(PaymentService::end(
            self.gateway(),
            &self.ledger,
            payment_id,
            now,
        )?)
    }

    /// Hard delete. `false` if unknown.
    pub fn remove_scheduled_payment(&self, payment_id: Uuid) -> Result<bool, TrackerError> {
        Ok(PaymentService::remove(
            self.gateway(),
            &self.ledger,
            payment_id,
        )?)
    }

    /// Resolves a scheduled payment by full id or unique id prefix.
    pub fn find_scheduled_payment(&self, query: &str) -> Result<&ScheduledPayment, TrackerError> {
        let query = query.trim().to_ascii_lowercase();
        let mut matches = self
            .ledger
            .scheduled_payments
            .iter()
            .filter(|payment| !query.is_empty() && payment.id.to_string().starts_with(&query));
        match (matches.next(), matches.next()) {
            (Some(payment), None) => Ok(payment),
            _ => Err(TrackerError::UnknownPayment(query)),
        }
    }

    pub fn advance(&self, period: Period) -> Result<DateTime<Utc>, TrackerError> {
        Ok(ClockService::advance(self.gateway(), period)?)
    }

    pub fn reverse(&self, period: Period) -> Result<DateTime<Utc>, TrackerError> {
        Ok(ClockService::reverse(self.gateway(), period)?)
    }

    pub fn reset(&self) -> Result<DateTime<Utc>, TrackerError> {
        Ok(ClockService::reset(self.gateway())?)
    }
}
