//! Status classification of observed processes.
//!
//! `observe` runs once per live pid per tick and decides between new, idle,
//! updated and renamed. `sweep_status` runs during the ascending sweep and turns
//! every record not seen this tick into vanished. Baselines only move in
//! `commit`, which the sweep calls when a report line is actually produced.

use crate::process::ProcSample;
use crate::registry::{ProcessRecord, ProcessRegistry, ProcessStatus};

/// Feeds one fresh sample into the registry and returns the resulting status.
pub fn observe(
    registry: &mut ProcessRegistry,
    pid: u32,
    sample: ProcSample,
    tick: u64,
) -> ProcessStatus {
    let record = match registry.get_mut(pid) {
        Some(record) => record,
        None => {
            registry.insert(
                pid,
                ProcessRecord::first_seen(pid, sample.ppid, sample.name, sample.uss, tick),
            );
            return ProcessStatus::New;
        }
    };

    record.sampled_uss = sample.uss;
    record.last_seen_tick = tick;

    let mut status = ProcessStatus::Idle;
    if record.sampled_uss != record.reported_uss {
        status = ProcessStatus::Updated;
    }
    // Must stay last: a rename wins over a memory change in the same tick.
    if sample.name != record.name {
        status = ProcessStatus::Renamed;
    }
    record.sampled_name = sample.name;
    record.status = status;
    status
}

/// Final status of a record at sweep time.
pub fn sweep_status(record: &ProcessRecord, tick: u64) -> ProcessStatus {
    if record.last_seen_tick != tick {
        return ProcessStatus::Vanished;
    }
    match record.status {
        ProcessStatus::Unknown => ProcessStatus::Idle,
        other => other,
    }
}

/// Moves the staged values into the reported baseline after a report was produced.
pub fn commit(record: &mut ProcessRecord) {
    record.reported_uss = record.sampled_uss;
    if record.name != record.sampled_name {
        record.name = record.sampled_name.clone();
    }
}

/// Returns a record to the between-ticks baseline.
pub fn reset(record: &mut ProcessRecord) {
    record.status = ProcessStatus::Unknown;
}
