//! Forward simulation of scheduled debits: insolvency forecast and daily
//! balance projection.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use credit_domain::{Credits, DomainError, Ledger, Period, PlayerId};

use crate::{ledger_service::LedgerService, CoreError};

/// How far ahead the insolvency walk looks by default.
pub const REFERENCE_HORIZON_YEARS: i32 = 5;

/// Total amount due from all of a player's payments at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledDebit {
    pub instant: DateTime<Utc>,
    pub amount: Credits,
}

/// Projected balance at the start of day `day` after the reference instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionPoint {
    pub day: u32,
    pub instant: DateTime<Utc>,
    pub balance: Credits,
}

pub struct ForecastService;

impl ForecastService {
    /// Occurrences strictly after `as_of` and up to `horizon` of every payment
    /// active at `as_of`, with amounts landing on the same instant summed.
    pub fn consolidated_schedule(
        ledger: &Ledger,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Vec<ScheduledDebit> {
        let mut due: BTreeMap<DateTime<Utc>, Credits> = BTreeMap::new();
        for payment in LedgerService::active_scheduled_payments(ledger, player_id, as_of) {
            let Some(first) = payment.next_occurrence_after(as_of) else {
                continue;
            };
            if first > horizon {
                continue;
            }
            for instant in payment.occurrences_between(first, horizon) {
                let slot = due.entry(instant).or_insert(Credits::ZERO);
                *slot = *slot + payment.rule.amount();
            }
        }
        due.into_iter()
            .map(|(instant, amount)| ScheduledDebit { instant, amount })
            .collect()
    }

    /// Whole days from `as_of` until the balance can no longer cover a
    /// scheduled debit, looking [`REFERENCE_HORIZON_YEARS`] ahead.
    pub fn time_to_insolvency(
        ledger: &Ledger,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
    ) -> Result<Option<i64>, CoreError> {
        Self::time_to_insolvency_within(
            ledger,
            player_id,
            as_of,
            Period::years(REFERENCE_HORIZON_YEARS),
        )
    }

    /// `Ok(None)` means the player never runs out within `horizon`, or has
    /// nothing scheduled at all. `Ok(Some(0))` means already insolvent.
    pub fn time_to_insolvency_within(
        ledger: &Ledger,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
        horizon: Period,
    ) -> Result<Option<i64>, CoreError> {
        if LedgerService::active_scheduled_payments(ledger, player_id, as_of).is_empty() {
            return Ok(None);
        }
        let mut balance = LedgerService::balance_as_of(ledger, player_id, as_of);
        if balance.value() <= 0.0 {
            return Ok(Some(0));
        }

        let horizon = horizon
            .checked_add_to(as_of)
            .ok_or(DomainError::InstantOutOfRange)?;
        for debit in Self::consolidated_schedule(ledger, player_id, as_of, horizon) {
            if balance.is_less_than(&debit.amount) {
                return Ok(Some(whole_days_between(as_of, debit.instant)));
            }
            balance = balance - debit.amount;
        }
        Ok(None)
    }

    /// One point per day for `days` days starting at `as_of`. Recorded
    /// entries dated after `as_of` and scheduled debits strictly after it are
    /// bucketed by whole days elapsed since `as_of` and count from that day on,
    /// so a debit twelve hours out already lowers day 0.
    pub fn daily_projection(
        ledger: &Ledger,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
        days: u32,
    ) -> Result<Vec<ProjectionPoint>, CoreError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let end = as_of
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or(DomainError::InstantOutOfRange)?;

        let mut deltas = vec![Credits::ZERO; days as usize];
        let mut bucket = |instant: DateTime<Utc>, amount: Credits| {
            let index = (instant - as_of).num_days();
            if let Some(slot) = usize::try_from(index).ok().and_then(|i| deltas.get_mut(i)) {
                *slot = *slot + amount;
            }
        };
        for entry in ledger
            .entries_for(player_id)
            .filter(|entry| entry.instant > as_of && entry.instant < end)
        {
            bucket(entry.instant, entry.amount);
        }
        for debit in Self::consolidated_schedule(ledger, player_id, as_of, end) {
            bucket(debit.instant, -debit.amount);
        }

        let mut balance = LedgerService::balance_as_of(ledger, player_id, as_of);
        let points = deltas
            .into_iter()
            .zip(0..days)
            .map(|(delta, day)| {
                balance = balance + delta;
                ProjectionPoint {
                    day,
                    instant: as_of + Duration::days(i64::from(day)),
                    balance,
                }
            })
            .collect();
        Ok(points)
    }
}

fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(0)
}
