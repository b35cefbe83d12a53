//! Snapshot aggregate of everything the ledger services read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerEntry, Player, PlayerId, ScheduledPayment};

/// Exposes a stable identifier for records held by the ledger.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

impl Identifiable for Player {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identifiable for LedgerEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Identifiable for ScheduledPayment {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Players, recorded entries and scheduled payments as of one snapshot.
///
/// Entries keep their arrival order; readers that need chronological order
/// sort stably by instant so ties stay in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
    #[serde(default)]
    pub scheduled_payments: Vec<ScheduledPayment>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        find(&self.players, id)
    }

    /// Resolves a player by id or case-insensitive name.
    pub fn find_player(&self, query: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.matches(query))
    }

    pub fn scheduled_payment(&self, id: Uuid) -> Option<&ScheduledPayment> {
        find(&self.scheduled_payments, id)
    }

    pub fn entries_for(&self, player_id: PlayerId) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.player_id == player_id)
    }

    /// Player's entries by instant ascending, ties in arrival order.
    pub fn sorted_entries_for(&self, player_id: PlayerId) -> Vec<&LedgerEntry> {
        let mut entries: Vec<_> = self.entries_for(player_id).collect();
        entries.sort_by_key(|entry| entry.instant);
        entries
    }

    pub fn payments_for(
        &self,
        player_id: PlayerId,
    ) -> impl Iterator<Item = &ScheduledPayment> + '_ {
        self.scheduled_payments
            .iter()
            .filter(move |payment| payment.player_id == player_id)
    }

    pub fn add_player(&mut self, player: Player) -> PlayerId {
        let id = player.id;
        self.players.push(player);
        id
    }

    pub fn add_entry(&mut self, entry: LedgerEntry) -> Uuid {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn add_scheduled_payment(&mut self, payment: ScheduledPayment) -> Uuid {
        let id = payment.id;
        self.scheduled_payments.push(payment);
        id
    }

    /// Replaces the stored payment with the same id; false if none matched.
    pub fn replace_scheduled_payment(&mut self, payment: ScheduledPayment) -> bool {
        match self
            .scheduled_payments
            .iter_mut()
            .find(|existing| existing.id == payment.id)
        {
            Some(slot) => {
                *slot = payment;
                true
            }
            None => false,
        }
    }

    pub fn remove_scheduled_payment(&mut self, id: Uuid) -> Option<ScheduledPayment> {
        remove(&mut self.scheduled_payments, id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        remove(&mut self.players, id)
    }

    /// Drops the player's entries and scheduled payments, returning how many
    /// of each were removed.
    pub fn remove_player_records(&mut self, player_id: PlayerId) -> (usize, usize) {
        let entries_before = self.entries.len();
        self.entries.retain(|entry| entry.player_id != player_id);
        let payments_before = self.scheduled_payments.len();
        self.scheduled_payments
            .retain(|payment| payment.player_id != player_id);
        (
            entries_before - self.entries.len(),
            payments_before - self.scheduled_payments.len(),
        )
    }
}

fn find<T: Identifiable>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

fn remove<T: Identifiable>(items: &mut Vec<T>, id: Uuid) -> Option<T> {
    let position = items.iter().position(|item| item.id() == id)?;
    Some(items.remove(position))
}
