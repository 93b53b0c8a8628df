//! Registry of observed processes.
//!
//! Records are keyed by pid and kept in ascending pid order so that the sweep
//! reports in a deterministic order. The registry is owned by the sampling cycle
//! and only touched from the event loop thread.

use std::collections::BTreeMap;

/// Classification of a record for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Not classified yet this tick (baseline after reporting).
    Unknown,
    New,
    Idle,
    Updated,
    Renamed,
    Vanished,
}

/// State kept for one process id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Captured at first observation only.
    pub ppid: Option<u32>,
    /// Name as last told to the consumer.
    pub name: Option<String>,
    /// Name read in the current tick; becomes `name` when a report is produced.
    pub sampled_name: Option<String>,
    /// Memory as last told to the consumer.
    pub reported_uss: u64,
    pub sampled_uss: u64,
    pub last_seen_tick: u64,
    pub status: ProcessStatus,
}

impl ProcessRecord {
    /// Creates the record for a pid seen for the first time.
    pub fn first_seen(pid: u32, ppid: Option<u32>, name: Option<String>, uss: u64, tick: u64) -> Self {
        Self {
            pid,
            ppid,
            sampled_name: name.clone(),
            name,
            reported_uss: uss,
            sampled_uss: uss,
            last_seen_tick: tick,
            status: ProcessStatus::New,
        }
    }
}

/// Ordered store of process records.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    records: BTreeMap<u32, ProcessRecord>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    pub fn get_mut(&mut self, pid: u32) -> Option<&mut ProcessRecord> {
        self.records.get_mut(&pid)
    }

    /// Inserts or replaces the record stored under `pid`.
    pub fn insert(&mut self, pid: u32, record: ProcessRecord) {
        self.records.insert(pid, record);
    }

    pub fn remove(&mut self, pid: u32) -> Option<ProcessRecord> {
        self.records.remove(&pid)
    }

    /// Point-in-time copy of every record in ascending pid order.
    ///
    /// The copy is fully materialized, so the registry may be mutated freely
    /// while walking it.
    pub fn snapshot_ascending(&self) -> Vec<ProcessRecord> {
        self.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.records.contains_key(&pid)
    }
}
