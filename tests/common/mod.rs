#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use calorie_core::storage::{JsonFileStore, StorePaths};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Returns a fresh directory that is removed when the test binary exits.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a file store with the standard layout below a fresh home directory.
pub fn setup_file_store() -> (JsonFileStore, PathBuf) {
    let home = temp_home();
    let store = JsonFileStore::open(StorePaths::under(&home)).expect("open json store");
    (store, home)
}

/// Small deterministic generator so property runs are reproducible.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}
