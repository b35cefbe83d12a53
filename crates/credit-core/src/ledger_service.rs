//! Balance reconstruction and timeline materialization over a ledger snapshot.

use chrono::{DateTime, Utc};
use credit_domain::{Credits, Ledger, PlayerId, ScheduledPayment, TimelineEntry};

/// Pure read-side computations. Every method takes the instant explicitly.
pub struct LedgerService;

impl LedgerService {
    /// Recorded entries up to `as_of` plus the virtual debits of every
    /// scheduled payment still active at `as_of`.
    ///
    /// Occurrences are never persisted, so a payment that is also recorded
    /// manually counts twice.
    pub fn balance_as_of(ledger: &Ledger, player_id: PlayerId, as_of: DateTime<Utc>) -> Credits {
        let base: Credits = ledger
            .entries_for(player_id)
            .filter(|entry| entry.instant <= as_of)
            .map(|entry| entry.amount)
            .sum();
        base + Self::periodic_delta(ledger, player_id, as_of)
    }

    /// Signed total of scheduled occurrences from each active payment's start
    /// through `as_of`.
    pub fn periodic_delta(ledger: &Ledger, player_id: PlayerId, as_of: DateTime<Utc>) -> Credits {
        ledger
            .payments_for(player_id)
            .filter(|payment| payment.is_active(as_of))
            .map(|payment| {
                let count = payment
                    .occurrences_between(payment.start_instant, as_of)
                    .count();
                -payment.rule.amount().multiply(count as f64)
            })
            .sum()
    }

    /// Payments of the player active at `as_of`, by start instant then name.
    pub fn active_scheduled_payments(
        ledger: &Ledger,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
    ) -> Vec<&ScheduledPayment> {
        let mut payments: Vec<_> = ledger
            .payments_for(player_id)
            .filter(|payment| payment.is_active(as_of))
            .collect();
        payments.sort_by(|a, b| {
            a.start_instant
                .cmp(&b.start_instant)
                .then_with(|| a.name.cmp(&b.name))
        });
        payments
    }

    /// Recorded entries up to `end` merged with one virtual debit per
    /// occurrence in `[start, end]` of each payment active at `end`.
    ///
    /// Sorted by instant; on ties recorded entries come first.
    pub fn materialize_virtual_entries(
        ledger: &Ledger,
        player_id: PlayerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<TimelineEntry> {
        let mut timeline: Vec<TimelineEntry> = ledger
            .sorted_entries_for(player_id)
            .into_iter()
            .filter(|entry| entry.instant <= end)
            .cloned()
            .map(TimelineEntry::Recorded)
            .collect();

        for payment in ledger
            .payments_for(player_id)
            .filter(|payment| payment.is_active(end))
        {
            let amount = -payment.rule.amount();
            timeline.extend(payment.occurrences_between(start, end).map(|instant| {
                TimelineEntry::Virtual {
                    payment_id: payment.id,
                    player_id,
                    amount,
                    instant,
                }
            }));
        }

        timeline.sort_by_key(|entry| entry.instant());
        timeline
    }

    /// Sum of every player's balance at `as_of`.
    pub fn total_balance(ledger: &Ledger, as_of: DateTime<Utc>) -> Credits {
        ledger
            .players
            .iter()
            .map(|player| Self::balance_as_of(ledger, player.id, as_of))
            .sum()
    }
}
