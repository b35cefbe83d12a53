//! Scheduled payment lifecycle: create, end (soft delete), remove.

use chrono::{DateTime, Utc};
use credit_domain::{
    Credits, DomainError, Ledger, Period, PlayerId, RecurringPayment, ScheduledPayment,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{CoreError, LedgerGateway, PlayerService};

pub struct PaymentService;

impl PaymentService {
    pub fn schedule(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        player_id: PlayerId,
        name: &str,
        rule: RecurringPayment,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Uuid, CoreError> {
        if ledger.player(player_id).is_none() {
            return Err(CoreError::PlayerNotFound(player_id));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("payment name must not be empty".into()));
        }
        if end.map_or(false, |end| end < start) {
            return Err(CoreError::Validation(
                "payment cannot end before it starts".into(),
            ));
        }
        let payment = ScheduledPayment::new(player_id, name, rule, start, end);
        let id = payment.id;
        info!(payment = %id, player = %player_id, label = %payment, "scheduled payment added");
        gateway.add_scheduled_payment(payment)?;
        Ok(id)
    }

    /// Splits a whole-credit recurring `total` across `players` the same way
    /// credits are distributed and schedules one payment per non-zero share.
    pub fn schedule_split(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        players: &[PlayerId],
        name: &str,
        total: i64,
        period: Period,
        start: DateTime<Utc>,
    ) -> Result<Vec<(PlayerId, i64, Uuid)>, CoreError> {
        let mut scheduled = Vec::with_capacity(players.len());
        for (player_id, share) in PlayerService::distribute(total, players) {
            if share == 0 {
                continue;
            }
            let rule = RecurringPayment::new(Credits::from(share), period)?;
            let id = Self::schedule(gateway, ledger, player_id, name, rule, start, None)?;
            scheduled.push((player_id, share, id));
        }
        info!(name, total, players = players.len(), "split payment scheduled");
        Ok(scheduled)
    }

    /// Closes the payment's window one day before `now`, keeping its history.
    /// Returns `false` when the id is not in the snapshot.
    pub fn end(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let Some(payment) = ledger.scheduled_payment(payment_id) else {
            warn!(payment = %payment_id, "end requested for unknown scheduled payment");
            return Ok(false);
        };
        let end = Period::days(1)
            .checked_sub_from(now)
            .ok_or(DomainError::InstantOutOfRange)?;
        gateway.update_scheduled_payment(payment.end_at(end))?;
        info!(payment = %payment_id, end = %end, "scheduled payment ended");
        Ok(true)
    }

    /// Deletes the payment and every occurrence it would have produced.
    /// Returns `false` when the id is not in the snapshot.
    pub fn remove(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        payment_id: Uuid,
    ) -> Result<bool, CoreError> {
        if ledger.scheduled_payment(payment_id).is_none() {
            warn!(payment = %payment_id, "remove requested for unknown scheduled payment");
            return Ok(false);
        }
        gateway.remove_scheduled_payment(payment_id)?;
        info!(payment = %payment_id, "scheduled payment removed");
        Ok(true)
    }
}
