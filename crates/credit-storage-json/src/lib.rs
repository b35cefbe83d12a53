use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use credit_core::{CoreError, GatewayError, GatewayState, LedgerGateway, Subscription, Topic};
use credit_domain::{Ledger, LedgerEntry, Player, PlayerId, ScheduledPayment, SimulationClock};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const LEDGER_FILE: &str = "ledger.json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    schema_version: u32,
    clock: &'a SimulationClock,
    ledger: &'a Ledger,
}

#[derive(Deserialize)]
struct Document {
    schema_version: u32,
    clock: SimulationClock,
    #[serde(default)]
    ledger: Ledger,
}

/// File-backed gateway holding the whole campaign in one JSON document.
///
/// Every mutation rewrites the document atomically before subscribers are
/// notified, so a failed write leaves both disk and memory untouched.
pub struct JsonGateway {
    path: PathBuf,
    state: Mutex<GatewayState>,
}

impl JsonGateway {
    /// Opens `dir/ledger.json`, creating it with `initial_clock` when absent.
    pub fn in_dir(dir: &Path, initial_clock: SimulationClock) -> Result<Self, CoreError> {
        Self::open(dir.join(LEDGER_FILE), initial_clock)
    }

    pub fn open(path: impl Into<PathBuf>, initial_clock: SimulationClock) -> Result<Self, CoreError> {
        let path = path.into();
        let (ledger, clock) = if path.exists() {
            let document = load_document(&path)?;
            debug!(
                path = %path.display(),
                players = document.ledger.players.len(),
                entries = document.ledger.entries.len(),
                "ledger document loaded"
            );
            (document.ledger, document.clock)
        } else {
            let ledger = Ledger::new();
            save_document(&path, &ledger, &initial_clock)?;
            info!(path = %path.display(), now = %initial_clock.current(), "ledger document created");
            (ledger, initial_clock)
        };
        Ok(Self {
            path,
            state: Mutex::new(GatewayState::new(ledger, clock)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn state(&self) -> Result<MutexGuard<'_, GatewayState>, GatewayError> {
        self.state.lock().map_err(|_| {
            warn!(path = %self.path.display(), "json gateway lock poisoned");
            GatewayError::Unavailable
        })
    }

    fn apply<F>(&self, topics: &[Topic], change: F) -> Result<(), GatewayError>
    where
        F: FnOnce(&mut Ledger),
    {
        let path = &self.path;
        self.state()?.apply_ledger(topics, change, |ledger, clock| {
            commit(path, ledger, clock)
        })
    }

    fn apply_clock<F>(&self, change: F) -> Result<SimulationClock, GatewayError>
    where
        F: FnOnce(&mut SimulationClock),
    {
        let path = &self.path;
        self.state()?
            .apply_clock(change, |ledger, clock| commit(path, ledger, clock))
    }
}

impl LedgerGateway for JsonGateway {
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
        debug!(entry = %entry.id, player = %entry.player_id, amount = %entry.amount, "persisting entry");
        self.apply(&[Topic::Entries], |ledger| {
            ledger.add_entry(entry);
        })
    }

    fn add_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError> {
        debug!(payment = %payment.id, player = %payment.player_id, "persisting scheduled payment");
        self.apply(&[Topic::ScheduledPayments], |ledger| {
            ledger.add_scheduled_payment(payment);
        })
    }

    fn update_scheduled_payment(&self, payment: ScheduledPayment) -> Result<(), GatewayError> {
        let id = payment.id;
        self.apply(&[Topic::ScheduledPayments], |ledger| {
            if !ledger.replace_scheduled_payment(payment) {
                debug!(payment = %id, "update for unknown scheduled payment ignored");
            }
        })
    }

    fn remove_scheduled_payment(&self, id: Uuid) -> Result<(), GatewayError> {
        self.apply(&[Topic::ScheduledPayments], |ledger| {
            ledger.remove_scheduled_payment(id);
        })
    }

    fn remove_entries_for_player(&self, player_id: PlayerId) -> Result<(), GatewayError> {
        self.apply(&[Topic::Entries, Topic::ScheduledPayments], |ledger| {
            let (entries, payments) = ledger.remove_player_records(player_id);
            debug!(player = %player_id, entries, payments, "removed player records");
        })
    }

    fn add_player(&self, player: Player) -> Result<(), GatewayError> {
        self.apply(&[Topic::Players], |ledger| {
            ledger.add_player(player);
        })
    }

    fn remove_player(&self, player_id: PlayerId) -> Result<(), GatewayError> {
        self.apply(&[Topic::Players], |ledger| {
            ledger.remove_player(player_id);
        })
    }

    fn clock_state(&self) -> Result<SimulationClock, GatewayError> {
        Ok(self.state()?.clock())
    }

    fn set_current_instant(&self, instant: DateTime<Utc>) -> Result<(), GatewayError> {
        self.apply_clock(|clock| clock.set_current(instant))
            .map(|_| ())
    }

    fn reset_instant(&self) -> Result<DateTime<Utc>, GatewayError> {
        let clock = self.apply_clock(|clock| {
            clock.reset();
        })?;
        Ok(clock.current())
    }
}

fn commit(path: &Path, ledger: &Ledger, clock: &SimulationClock) -> Result<(), GatewayError> {
    save_document(path, ledger, clock).map_err(|err| {
        warn!(path = %path.display(), error = %err, "failed to persist ledger document");
        GatewayError::Storage(err.to_string())
    })
}

/// Reads a ledger document, rejecting schema versions newer than this build.
pub fn load_document_from_path(path: &Path) -> Result<(Ledger, SimulationClock), CoreError> {
    let document = load_document(path)?;
    Ok((document.ledger, document.clock))
}

fn load_document(path: &Path) -> Result<Document, CoreError> {
    let data = fs::read_to_string(path)?;
    let document: Document =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if document.schema_version > SCHEMA_VERSION {
        return Err(GatewayError::UnsupportedSchema(document.schema_version).into());
    }
    Ok(document)
}

fn save_document(path: &Path, ledger: &Ledger, clock: &SimulationClock) -> Result<(), CoreError> {
    let document = DocumentRef {
        schema_version: SCHEMA_VERSION,
        clock,
        ledger,
    };
    let data =
        serde_json::to_string_pretty(&document).map_err(|err| CoreError::Serde(err.to_string()))?;
    write_atomic(path, data.as_bytes())?;
    Ok(())
}

/// Replaces `path` with `contents` through a temp file in the same
/// directory; readers see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
