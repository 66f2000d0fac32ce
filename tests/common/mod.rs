#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

use budget_forecast::plan_core::FixedClock;
use budget_forecast::PlanningEngine;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// A fresh directory that outlives the calling test.
pub fn test_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Engine over a file-backed database, pinned to `today`.
pub fn setup_test_engine(today: NaiveDate) -> (PlanningEngine, PathBuf) {
    let db_path = test_dir().join("data").join("planning.db");
    let engine = PlanningEngine::open(&db_path, Box::new(FixedClock::new(today)))
        .expect("open planning engine");
    (engine, db_path)
}
