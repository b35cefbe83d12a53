//! One-off ledger movements and the combined (recorded + virtual) timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Credits, PlayerId};

/// An immutable, signed credit movement recorded for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub player_id: PlayerId,
    pub amount: Credits,
    pub instant: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(player_id: PlayerId, amount: Credits, instant: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            amount,
            instant,
        }
    }
}

/// A row of a player's history: either a recorded entry or a synthesized
/// occurrence of a scheduled payment that was never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Recorded(LedgerEntry),
    Virtual {
        payment_id: Uuid,
        player_id: PlayerId,
        amount: Credits,
        instant: DateTime<Utc>,
    },
}

impl TimelineEntry {
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Recorded(entry) => entry.instant,
            TimelineEntry::Virtual { instant, .. } => *instant,
        }
    }

    pub fn amount(&self) -> Credits {
        match self {
            TimelineEntry::Recorded(entry) => entry.amount,
            TimelineEntry::Virtual { amount, .. } => *amount,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        match self {
            TimelineEntry::Recorded(entry) => entry.player_id,
            TimelineEntry::Virtual { player_id, .. } => *player_id,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, TimelineEntry::Virtual { .. })
    }
}
