use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use credit_domain::{Ledger, LedgerEntry, Player, PlayerId, ScheduledPayment, SimulationClock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::{GatewayError, GatewayState, LedgerGateway, Subscription, Topic};

/// Gateway that keeps everything in process memory.
pub struct MemoryGateway {
    state: Mutex<GatewayState>,
}

fn no_commit(_: &Ledger, _: &SimulationClock) -> Result<(), GatewayError> {
    Ok(())
}

impl MemoryGateway {
    pub fn new(clock: SimulationClock) -> Self {
        Self::with_ledger(Ledger::new(), clock)
    }

    pub fn with_ledger(ledger: Ledger, clock: SimulationClock) -> Self {
        Self {
            state: Mutex::new(GatewayState::new(ledger, clock)),
        }
    }

    /// Live subscriber count across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.state().map(|state| state.subscriber_count()).unwrap_or(0)
    }

    fn state(&self) -> Result<MutexGuard<'_, GatewayState>, GatewayError> {
        self.state.lock().map_err(|_| {
            warn!("memory gateway lock poisoned");
            GatewayError::Unavailable
        })
    }
}

impl LedgerGateway for MemoryGateway {
    fn snapshot(&self) -> Result<Ledger, GatewayError> {
        Ok(self.state()?.ledger().clone())
    }

    fn subscribe_entries(&self) -> Subscription<Vec<LedgerEntry>> {
        match self.state() {
            Ok(mut state) => state.subscribe_entries(),
            Err(err) => Subscription::failed(err),
        }
    }

    fn subscribe_scheduled_payments(&self) -> Subscription<Vec<ScheduledPayment>> {
        match self.state() {
            Ok(mut state) => state.subscribe_scheduled_payments(),
            Err(err) => Subscription::failed(err),
        }
    }

    fn subscribe_players(&self) -> Subscription<Vec<Player>> {
        match self.state() {
            Ok(mut state) => state.subscribe_players(),
            Err(err) => Subscription::failed(err),
        }
    }

    fn add_entry(&self, entry: LedgerEntry) -> Result<(), GatewayError> {
        debug!(entry = %entry.id, player = %entry.player_id, "adding entry");
        self.state()?.apply_ledger(
            &[Topic::Entries],
            |ledger| {
                ledger.add_entry(entry);
            },
            no_commit,
        )
    }

    fn add_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError> {
        debug!(payment = %payment.id, player = %payment.player_id, "adding scheduled payment");
        self.state()?.apply_ledger(
            &[Topic::ScheduledPayments],
            |ledger| {
                ledger.add_scheduled_payment(payment);
            },
            no_commit,
        )
    }

    fn update_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError> {
        let id = payment.id;
        self.state()?.apply_ledger(
            &[Topic::ScheduledPayments],
            |ledger| {
                if !ledger.replace_scheduled_payment(payment) {
                    debug!(payment = %id, "update for unknown scheduled payment ignored");
                }
            },
            no_commit,
        )
    }

    fn remove_scheduled_payment(&self, id: Uuid) -> Result<(), GatewayError> {
        self.state()?.apply_ledger(
            &[Topic::ScheduledPayments],
            |ledger| {
                ledger.remove_scheduled_payment(id);
            },
            no_commit,
        )
    }

    fn remove_entries_for_player(&self, player_id: PlayerId) -> Result<(), GatewayError> {
        self.state()?.apply_ledger(
            &[Topic::Entries, Topic::ScheduledPayments],
            |ledger| {
                let (entries, payments) = ledger.remove_player_records(player_id);
                debug!(player = %player_id, entries, payments, "removed player records");
            },
            no_commit,
        )
    }

    fn add_player(&self, player: Player) -> Result<(), GatewayError> {
        self.state()?.apply_ledger(
            &[Topic::Players],
            |ledger| {
                ledger.add_player(player);
            },
            no_commit,
        )
    }

    fn remove_player(&self, player_id: PlayerId) -> Result<(), GatewayError> {
        self.state()?.apply_ledger(
            &[Topic::Players],
            |ledger| {
                ledger.remove_player(player_id);
            },
            no_commit,
        )
    }

    fn clock_state(&self) -> Result<SimulationClock, GatewayError> {
        Ok(self.state()?.clock())
    }

    fn set_current_instant(&self, instant: DateTime<Utc>) -> Result<(), GatewayError> {
        self.state()?
            .apply_clock(|clock| clock.set_current(instant), no_commit)
            .map(|_| ())
    }

    fn reset_instant(&self) -> Result<DateTime<Utc>, GatewayError> {
        let clock = self.state()?.apply_clock(
            |clock| {
                clock.reset();
            },
            no_commit,
        )?;
        Ok(clock.current())
    }
}
