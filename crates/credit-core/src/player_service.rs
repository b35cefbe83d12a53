//! Player roster and manual credit movements.

use chrono::{DateTime, Utc};
use credit_domain::{Credits, Ledger, LedgerEntry, Player, PlayerId};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{ledger_service::LedgerService, CoreError, LedgerGateway};

pub struct PlayerService;

impl PlayerService {
    /// Registers a player and records their opening credits at `at`.
    pub fn add_player(
        gateway: &dyn LedgerGateway,
        name: &str,
        opening_credits: Credits,
        at: DateTime<Utc>,
    ) -> Result<PlayerId, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("player name must not be empty".into()));
        }
        let player = Player::new(name);
        let id = player.id;
        gateway.add_player(player)?;
        gateway.add_entry(LedgerEntry::new(id, opening_credits, at))?;
        info!(player = %id, name, opening = %opening_credits, "player added");
        Ok(id)
    }

    /// Removes the player together with their entries and scheduled payments.
    pub fn remove_player(gateway: &dyn LedgerGateway, player_id: PlayerId) -> Result<(), CoreError> {
        gateway.remove_entries_for_player(player_id)?;
        gateway.remove_player(player_id)?;
        info!(player = %player_id, "player removed");
        Ok(())
    }

    pub fn add_credits(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        player_id: PlayerId,
        amount: Credits,
        at: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        ensure_player(ledger, player_id)?;
        let entry = LedgerEntry::new(player_id, amount, at);
        let id = entry.id;
        gateway.add_entry(entry)?;
        debug!(player = %player_id, amount = %amount, "credits recorded");
        Ok(id)
    }

    pub fn remove_credits(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        player_id: PlayerId,
        amount: Credits,
        at: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        Self::add_credits(gateway, ledger, player_id, -amount, at)
    }

    /// Records the difference between `target` and the balance at `at`.
    /// Returns `None` when the balance already matches.
    pub fn set_credits(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        player_id: PlayerId,
        target: Credits,
        at: DateTime<Utc>,
    ) -> Result<Option<Uuid>, CoreError> {
        ensure_player(ledger, player_id)?;
        let difference = target - LedgerService::balance_as_of(ledger, player_id, at);
        if difference.is_zero() {
            debug!(player = %player_id, "balance already at target");
            return Ok(None);
        }
        Self::add_credits(gateway, ledger, player_id, difference, at).map(Some)
    }

    /// Splits `total` across `players` as evenly as whole credits allow.
    ///
    /// Each player gets `total / n`; the first `total % n` players get one
    /// more. Negative totals split the same way with the sign flipped.
    pub fn distribute(total: i64, players: &[PlayerId]) -> Vec<(PlayerId, i64)> {
        if players.is_empty() {
            return Vec::new();
        }
        let total = i128::from(total);
        let count = players.len() as i128;
        let share = total.abs() / count;
        let remainder = total.abs() % count;
        players
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let extra = i128::from((index as i128) < remainder);
                let amount = total.signum() * (share + extra);
                (*id, amount.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
            })
            .collect()
    }

    /// Records one entry per player for their share of `total`.
    pub fn distribute_credits(
        gateway: &dyn LedgerGateway,
        ledger: &Ledger,
        players: &[PlayerId],
        total: i64,
        at: DateTime<Utc>,
    ) -> Result<Vec<(PlayerId, i64)>, CoreError> {
        let shares = Self::distribute(total, players);
        for (player_id, share) in &shares {
            if *share != 0 {
                Self::add_credits(gateway, ledger, *player_id, Credits::from(*share), at)?;
            }
        }
        info!(total, players = players.len(), "credits distributed");
        Ok(shares)
    }
}

fn ensure_player(ledger: &Ledger, player_id: PlayerId) -> Result<(), CoreError> {
    ledger
        .player(player_id)
        .map(|_| ())
        .ok_or(CoreError::PlayerNotFound(player_id))
}
