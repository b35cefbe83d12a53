//! Persistence gateway contract and the snapshot channels it feeds.
//!
//! Subscribers receive full collection snapshots, never deltas. A new
//! subscription is primed with the current state; later snapshots follow
//! every mutation that touches the subscribed collection.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use chrono::{DateTime, Utc};
use credit_domain::{Ledger, LedgerEntry, Player, PlayerId, ScheduledPayment, SimulationClock};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("unsupported schema version {0}")]
    UnsupportedSchema(u32),
    #[error("gateway state is unavailable")]
    Unavailable,
}

/// Backend that stores players, entries, scheduled payments and the
/// simulation clock.
///
/// Mutations are requests: callers must not assume their own snapshot
/// reflects a change until the next event arrives on a subscription.
pub trait LedgerGateway: Send + Sync {
    fn snapshot(&self) -> Result<Ledger, GatewayError>;

    fn subscribe_entries(&self) -> Subscription<Vec<LedgerEntry>>;
    fn subscribe_scheduled_payments(&self) -> Subscription<Vec<ScheduledPayment>>;
    fn subscribe_players(&self) -> Subscription<Vec<Player>>;

    fn add_entry(&self, entry: LedgerEntry) -> Result<(), GatewayError>;
    fn add_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError>;
    fn update_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError>;
    fn remove_scheduled_payment(&self, id: Uuid) -> Result<(), GatewayError>;
    /// Removes every entry and scheduled payment of the player.
    fn remove_entries_for_player(&self, player_id: PlayerId) -> Result<(), GatewayError>;
    fn add_player(&self, player: Player) -> Result<(), GatewayError>;
    fn remove_player(&self, player_id: PlayerId) -> Result<(), GatewayError>;

    fn clock_state(&self) -> Result<SimulationClock, GatewayError>;
    fn set_current_instant(&self, instant: DateTime<Utc>) -> Result<(), GatewayError>;
    fn reset_instant(&self) -> Result<DateTime<Utc>, GatewayError>;

    fn current_instant(&self) -> Result<DateTime<Utc>, GatewayError> {
        Ok(self.clock_state()?.current())
    }
}

/// Receiving end of a snapshot stream. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: Receiver<Result<T, GatewayError>>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: Receiver<Result<T, GatewayError>>) -> Self {
        Self { receiver }
    }

    /// A subscription that yields a single error and then ends.
    pub fn failed(error: GatewayError) -> Self {
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(Err(error));
        Self { receiver }
    }

    /// Every event queued since the last call, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<Result<T, GatewayError>> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

/// Collections a mutation can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Entries,
    ScheduledPayments,
    Players,
}

struct Subscribers<T> {
    senders: Vec<Sender<Result<T, GatewayError>>>,
}

impl<T: Clone> Subscribers<T> {
    fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    fn subscribe(&mut self, current: T) -> Subscription<T> {
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(Ok(current));
        self.senders.push(sender);
        Subscription::new(receiver)
    }

    fn publish(&mut self, value: &T) {
        self.senders
            .retain(|sender| sender.send(Ok(value.clone())).is_ok());
    }

    fn publish_error(&mut self, error: &GatewayError) {
        self.senders
            .retain(|sender| sender.send(Err(error.clone())).is_ok());
    }

    fn len(&self) -> usize {
        self.senders.len()
    }
}

/// Ledger, clock and subscriber lists shared by the gateway backends.
///
/// Every change is staged on a copy and handed to a `commit` callback first;
/// only when the commit succeeds is the copy swapped in and published.
pub struct GatewayState {
    ledger: Ledger,
    clock: SimulationClock,
    entries: Subscribers<Vec<LedgerEntry>>,
    payments: Subscribers<Vec<ScheduledPayment>>,
    players: Subscribers<Vec<Player>>,
}

impl GatewayState {
    pub fn new(ledger: Ledger, clock: SimulationClock) -> Self {
        Self {
            ledger,
            clock,
            entries: Subscribers::new(),
            payments: Subscribers::new(),
            players: Subscribers::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn subscribe_entries(&mut self) -> Subscription<Vec<LedgerEntry>> {
        let current = self.ledger.entries.clone();
        self.entries.subscribe(current)
    }

    pub fn subscribe_scheduled_payments(&mut self) -> Subscription<Vec<ScheduledPayment>> {
        let current = self.ledger.scheduled_payments.clone();
        self.payments.subscribe(current)
    }

    pub fn subscribe_players(&mut self) -> Subscription<Vec<Player>> {
        let current = self.ledger.players.clone();
        self.players.subscribe(current)
    }

    /// Live subscriber count across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.entries.len() + self.payments.len() + self.players.len()
    }

    pub fn apply_ledger<F, C>(&mut self, topics: &[Topic], change: F, commit: C) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut Ledger),
        C: FnOnce(&Ledger, &SimulationClock) -> Result<(), GatewayError>,
    {
        let mut staged = self.ledger.clone();
        change(&mut staged);
        if let Err(err) = commit(&staged, &self.clock) {
            self.publish_error(topics, &err);
            return Err(err);
        }
        self.ledger = staged;
        self.publish(topics);
        Ok(())
    }

    pub fn apply_clock<F, C>(&mut self, change: F, commit: C) -> Result<SimulationClock, GatewayError>
    where
        F: FnOnce(&mut SimulationClock),
        C: FnOnce(&Ledger, &SimulationClock) -> Result<(), GatewayError>,
    {
        let mut staged = self.clock;
        change(&mut staged);
        commit(&self.ledger, &staged)?;
        self.clock = staged;
        Ok(staged)
    }

    fn publish(&mut self, topics: &[Topic]) {
        for topic in topics {
            match topic {
                Topic::Entries => self.entries.publish(&self.ledger.entries),
                Topic::ScheduledPayments => self.payments.publish(&self.ledger.scheduled_payments),
                Topic::Players => self.players.publish(&self.ledger.players),
            }
        }
    }

    fn publish_error(&mut self, topics: &[Topic], error: &GatewayError) {
        for topic in topics {
            match topic {
                Topic::Entries => self.entries.publish_error(error),
                Topic::ScheduledPayments => self.payments.publish_error(error),
                Topic::Players => self.players.publish_error(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn state() -> GatewayState {
        let start = Utc.with_ymd_and_hms(2525, 1, 1, 0, 0, 0).unwrap();
        GatewayState::new(Ledger::new(), SimulationClock::new(start))
    }

    fn failing_commit(_: &Ledger, _: &SimulationClock) -> Result<(), GatewayError> {
        Err(GatewayError::Storage("disk full".into()))
    }

    #[test]
    fn failed_commit_publishes_error_and_keeps_previous_state() {
        let mut state = state();
        let players = state.subscribe_players();
        let entries = state.subscribe_entries();
        players.drain();
        entries.drain();

        let result = state.apply_ledger(
            &[Topic::Players],
            |ledger| {
                ledger.add_player(Player::new("Gorman"));
            },
            failing_commit,
        );

        assert_eq!(result, Err(GatewayError::Storage("disk full".into())));
        assert!(state.ledger().players.is_empty());
        let events = players.drain();
        assert_eq!(events, vec![Err(GatewayError::Storage("disk full".into()))]);
        assert!(entries.drain().is_empty());
    }

    #[test]
    fn failed_clock_commit_leaves_clock_untouched() {
        let mut state = state();
        let before = state.clock();
        let later = before.current() + chrono::Duration::days(3);

        let result = state.apply_clock(|clock| clock.set_current(later), failing_commit);
        assert!(result.is_err());
        assert_eq!(state.clock(), before);
    }

    #[test]
    fn failed_subscription_yields_its_error_once() {
        let subscription: Subscription<Vec<Player>> = Subscription::failed(GatewayError::Unavailable);
        assert_eq!(subscription.drain(), vec![Err(GatewayError::Unavailable)]);
        assert!(subscription.drain().is_empty());
    }
}
