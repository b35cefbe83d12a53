#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::{DateTime, TimeZone, Utc};
use credit_tracker::{
    core::MemoryGateway,
    domain::SimulationClock,
    storage::JsonGateway,
    Session,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn campaign_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2525, 1, 1, 0, 0, 0).unwrap()
}

/// A unique directory that outlives the calling test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn memory_session() -> Session {
    let gateway = MemoryGateway::new(SimulationClock::new(campaign_start()));
    Session::new(Box::new(gateway)).expect("open memory session")
}

/// A session over a JSON document in a fresh directory.
pub fn json_session() -> (Session, PathBuf) {
    let home = temp_home();
    let gateway =
        JsonGateway::in_dir(&home, SimulationClock::new(campaign_start())).expect("open gateway");
    (Session::new(Box::new(gateway)).expect("open json session"), home)
}

pub fn reopen(home: &PathBuf) -> Session {
    let gateway =
        JsonGateway::in_dir(home, SimulationClock::new(campaign_start())).expect("reopen gateway");
    Session::new(Box::new(gateway)).expect("reopen json session")
}
