//! Per-pid sampling on top of a process information source.
//!
//! `ProcessSource` is the seam between the diff engine and the operating system.
//! `ProcFs` reads a procfs-style tree; tests plug in in-memory sources.

use std::path::PathBuf;
use tracing::trace;

use crate::process::memory::{parse_uss_for_process, BufferConfig};
use crate::process::scanner::{collect_pids, read_parent_pid, read_process_name};

/// Read access to the live process table.
///
/// Every per-pid read may fail because the process exited mid-scan; failures are
/// reported as `None`, never as errors.
pub trait ProcessSource {
    /// Enumerates currently running process ids.
    fn list_pids(&self) -> Vec<u32>;

    /// Private (unshared) resident memory in bytes.
    fn private_memory_bytes(&self, pid: u32) -> Option<u64>;

    /// Short process name.
    fn process_name(&self, pid: u32) -> Option<String>;

    /// Parent process id.
    fn parent_pid(&self, pid: u32) -> Option<u32>;
}

impl<S: ProcessSource + ?Sized> ProcessSource for &S {
    fn list_pids(&self) -> Vec<u32> {
        (**self).list_pids()
    }

    fn private_memory_bytes(&self, pid: u32) -> Option<u64> {
        (**self).private_memory_bytes(pid)
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        (**self).process_name(pid)
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        (**self).parent_pid(pid)
    }
}

/// Process source backed by a procfs mount (normally `/proc`).
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    buffers: BufferConfig,
    prefer_rollup: bool,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>, buffers: BufferConfig, prefer_rollup: bool) -> Self {
        Self {
            root: root.into(),
            buffers,
            prefer_rollup,
        }
    }

    fn pid_path(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl ProcessSource for ProcFs {
    fn list_pids(&self) -> Vec<u32> {
        collect_pids(&self.root)
    }

    fn private_memory_bytes(&self, pid: u32) -> Option<u64> {
        match parse_uss_for_process(&self.pid_path(pid), &self.buffers, self.prefer_rollup) {
            Ok(uss) => Some(uss),
            Err(e) => {
                trace!("No memory map for pid {}: {}", pid, e);
                None
            }
        }
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        read_process_name(&self.pid_path(pid), self.buffers.io_kb)
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        read_parent_pid(&self.pid_path(pid), self.buffers.io_kb)
    }
}

/// Values read for one process in one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcSample {
    pub uss: u64,
    pub name: Option<String>,
    /// Only looked up on first observation.
    pub ppid: Option<u32>,
}

/// Outcome of sampling a single pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    /// The process went away between enumeration and sampling.
    NotAvailable,
    Observed(ProcSample),
}

/// Samples one pid. The memory map decides availability: a process whose map
/// cannot be read is treated as gone for this tick.
pub fn sample_process<S: ProcessSource + ?Sized>(
    source: &S,
    pid: u32,
    first_observation: bool,
) -> Sample {
    let uss = match source.private_memory_bytes(pid) {
        Some(v) => v,
        None => return Sample::NotAvailable,
    };

    let name = source.process_name(pid);
    let ppid = if first_observation {
        source.parent_pid(pid)
    } else {
        None
    };

    Sample::Observed(ProcSample { uss, name, ppid })
}
