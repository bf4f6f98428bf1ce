// src/batch/tracker.rs
//! Durable run progress: which subjects are done, which failed.
//!
//! `tracker.json` holds the counters and the processed set as one snapshot;
//! `failed.log` is an append-only list of ids. Every change goes through
//! `Tracker::update`, which mutates memory and writes disk under one lock.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::consts::{FAILED_FILE, TRACKER_FILE};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub total_subjects: usize,
    pub processed_count: usize,
    pub processed: BTreeSet<String>,
    /// Kept in `failed.log`, not in the snapshot. Order is append order.
    #[serde(skip)]
    pub failed: Vec<String>,
}

impl ProcessingState {
    pub fn is_complete(&self) -> bool {
        self.total_subjects > 0 && self.processed_count >= self.total_subjects
    }

    /// Restore the invariants after loading from disk.
    fn repair(&mut self) {
        if self.processed_count != self.processed.len() {
            logw!(
                "Tracker count {} disagrees with {} processed ids; using the set",
                self.processed_count,
                self.processed.len()
            );
            self.processed_count = self.processed.len();
        }
        let processed = &self.processed;
        let mut seen = BTreeSet::new();
        self.failed.retain(|id| !processed.contains(id) && seen.insert(id.clone()));
    }
}

/// Which durable writes an update needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Persist {
    pub snapshot: bool,
    pub failed: FailedWrite,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FailedWrite {
    #[default]
    Keep,
    Append(String),
    Rewrite,
}

impl Persist {
    pub const NONE: Persist = Persist { snapshot: false, failed: FailedWrite::Keep };

    pub fn write_snapshot() -> Self {
        Self { snapshot: true, ..Self::default() }
    }
}

pub struct Tracker {
    dir: PathBuf,
    state: Mutex<ProcessingState>,
}

fn read_failed(p: &Path) -> io::Result<Vec<String>> {
    match fs::read_to_string(p) {
        Ok(text) => Ok(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn read_snapshot(p: &Path) -> io::Result<ProcessingState> {
    match fs::read_to_string(p) {
        Ok(text) => serde_json::from_str(&text).map_err(io::Error::other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ProcessingState::default()),
        Err(e) => Err(e),
    }
}

fn write_atomic(p: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = p.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, p)
}

impl Tracker {
    /// Load state from `dir`, falling back to empty defaults on any read
    /// problem. A state left complete by an interrupted run is reset here.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            loge!("Cannot create store dir {}: {e}", dir.display());
        }

        let mut state = read_snapshot(&dir.join(TRACKER_FILE)).unwrap_or_else(|e| {
            loge!("Cannot load tracker snapshot, starting empty: {e}");
            ProcessingState::default()
        });
        state.failed = read_failed(&dir.join(FAILED_FILE)).unwrap_or_else(|e| {
            loge!("Cannot load failed log, starting empty: {e}");
            Vec::new()
        });
        state.repair();
        logd!(
            "Tracker loaded: {}/{} processed, {} failed",
            state.processed_count,
            state.total_subjects,
            state.failed.len()
        );

        let tracker = Self { dir, state: Mutex::new(state) };
        tracker.reset_if_complete();
        tracker
    }

    /// The one way state changes. `f` mutates and says what must hit disk;
    /// the writes happen before the lock is released.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProcessingState) -> (R, Persist)) -> R {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (out, persist) = f(&mut st);
        self.persist(&st, &persist);
        out
    }

    fn persist(&self, st: &ProcessingState, p: &Persist) {
        if p.snapshot {
            let res = serde_json::to_vec_pretty(st)
                .map_err(io::Error::other)
                .and_then(|bytes| write_atomic(&self.dir.join(TRACKER_FILE), &bytes));
            if let Err(e) = res {
                loge!("Failed to write tracker snapshot: {e}");
            }
        }
        let failed_path = self.dir.join(FAILED_FILE);
        let res = match &p.failed {
            FailedWrite::Keep => Ok(()),
            FailedWrite::Append(id) => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&failed_path)
                .and_then(|mut f| writeln!(f, "{id}")),
            FailedWrite::Rewrite => {
                let body: String = st.failed.iter().map(|id| join!(id, "\n")).collect();
                write_atomic(&failed_path, body.as_bytes())
            }
        };
        if let Err(e) = res {
            loge!("Failed to write {}: {e}", failed_path.display());
        }
    }

    pub fn snapshot(&self) -> ProcessingState {
        self.update(|st| (st.clone(), Persist::NONE))
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.update(|st| (st.processed.contains(id), Persist::NONE))
    }

    pub fn set_total(&self, total: usize) {
        self.update(|st| {
            if st.total_subjects == total {
                return ((), Persist::NONE);
            }
            st.total_subjects = total;
            ((), Persist::write_snapshot())
        })
    }

    /// Record a success. Returns false if the id was already processed.
    pub fn mark_processed(&self, id: &str) -> bool {
        self.update(|st| mark_processed(st, id))
    }

    /// Record a permanent failure. Processed ids and ids already listed are
    /// left alone.
    pub fn mark_failed(&self, id: &str) -> bool {
        self.update(|st| mark_failed(st, id))
    }

    /// Empty the failed list, returning what it held.
    pub fn take_failed(&self) -> Vec<String> {
        self.update(|st| {
            let taken = std::mem::take(&mut st.failed);
            let persist = Persist { snapshot: false, failed: FailedWrite::Rewrite };
            (taken, persist)
        })
    }

    /// Once every subject is processed, start the next cycle with an empty
    /// processed set. The total stays.
    pub fn reset_if_complete(&self) -> bool {
        self.update(|st| {
            if !st.is_complete() {
                return (false, Persist::NONE);
            }
            logf!("All {} subjects processed; resetting tracker", st.total_subjects);
            st.processed.clear();
            st.processed_count = 0;
            (true, Persist::write_snapshot())
        })
    }
}

/// Shared by `Tracker::mark_processed` and guarded pass recording.
pub(crate) fn mark_processed(st: &mut ProcessingState, id: &str) -> (bool, Persist) {
    if !st.processed.insert(s!(id)) {
        return (false, Persist::NONE);
    }
    st.processed_count = st.processed.len();
    let was_failed = st.failed.iter().any(|f| f == id);
    st.failed.retain(|f| f != id);
    let failed = if was_failed { FailedWrite::Rewrite } else { FailedWrite::Keep };
    (true, Persist { snapshot: true, failed })
}

pub(crate) fn mark_failed(st: &mut ProcessingState, id: &str) -> (bool, Persist) {
    if st.processed.contains(id) || st.failed.iter().any(|f| f == id) {
        return (false, Persist::NONE);
    }
    st.failed.push(s!(id));
    (true, Persist { snapshot: false, failed: FailedWrite::Append(s!(id)) })
}
