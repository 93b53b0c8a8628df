//! In-memory process table shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use herakles_uss_feed::process::ProcessSource;

#[derive(Clone)]
struct FakeProcess {
    uss: Option<u64>,
    name: Option<String>,
    ppid: Option<u32>,
}

/// Process table the test mutates between ticks. Clones share the same table.
#[derive(Clone, Default)]
pub struct FakeProcTable {
    procs: Arc<Mutex<BTreeMap<u32, FakeProcess>>>,
}

impl FakeProcTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a process with parent 1.
    pub fn spawn(&self, pid: u32, uss: u64, name: &str) {
        self.set(pid, Some(uss), Some(name), Some(1));
    }

    pub fn set(&self, pid: u32, uss: Option<u64>, name: Option<&str>, ppid: Option<u32>) {
        self.procs.lock().unwrap().insert(
            pid,
            FakeProcess {
                uss,
                name: name.map(str::to_string),
                ppid,
            },
        );
    }

    pub fn set_uss(&self, pid: u32, uss: u64) {
        if let Some(p) = self.procs.lock().unwrap().get_mut(&pid) {
            p.uss = Some(uss);
        }
    }

    /// Grows the memory of every process by `bytes`.
    pub fn grow_all(&self, bytes: u64) {
        for p in self.procs.lock().unwrap().values_mut() {
            p.uss = p.uss.map(|uss| uss + bytes);
        }
    }

    pub fn rename(&self, pid: u32, name: Option<&str>) {
        if let Some(p) = self.procs.lock().unwrap().get_mut(&pid) {
            p.name = name.map(str::to_string);
        }
    }

    pub fn kill(&self, pid: u32) {
        self.procs.lock().unwrap().remove(&pid);
    }
}

impl ProcessSource for FakeProcTable {
    fn list_pids(&self) -> Vec<u32> {
        self.procs.lock().unwrap().keys().copied().collect()
    }

    fn private_memory_bytes(&self, pid: u32) -> Option<u64> {
        self.procs.lock().unwrap().get(&pid).and_then(|p| p.uss)
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        self.procs.lock().unwrap().get(&pid).and_then(|p| p.name.clone())
    }

    fn parent_pid(&self, pid: u32) -> Option<u32> {
        self.procs.lock().unwrap().get(&pid).and_then(|p| p.ppid)
    }
}
