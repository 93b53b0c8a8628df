//! One tick of the change feed.
//!
//! A cycle enumerates the live pids, classifies each against the registry and then
//! sweeps a materialized ascending snapshot of the registry to produce reports and
//! drop vanished records.

use std::time::Instant;
use tracing::{debug, instrument, trace};

use crate::classifier;
use crate::process::{sample_process, ProcessSource, Sample};
use crate::registry::{ProcessRegistry, ProcessStatus};
use crate::report::Report;

/// Result of one sampling cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub tick: u64,
    pub resync: bool,
    /// Reports in ascending pid order.
    pub reports: Vec<Report>,
    /// Pids that were enumerated.
    pub enumerated: usize,
    /// Enumerated pids that went away before they could be sampled.
    pub unavailable: usize,
    /// Records left in the registry after the sweep.
    pub tracked: usize,
    pub duration_seconds: f64,
}

/// Owns the registry and the tick counter and drives ticks against a source.
pub struct SamplingCycle<S> {
    source: S,
    registry: ProcessRegistry,
    tick: u64,
}

impl<S: ProcessSource> SamplingCycle<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            registry: ProcessRegistry::new(),
            tick: 0,
        }
    }

    /// Sequence number of the last completed tick (0 before the first one).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Runs one full tick. With `resync` every live record is reported as new.
    #[instrument(skip(self), fields(tick = self.tick + 1))]
    pub fn run(&mut self, resync: bool) -> CycleOutcome {
        let start = Instant::now();
        self.tick += 1;
        let tick = self.tick;

        let pids = self.source.list_pids();
        let mut unavailable = 0usize;

        for &pid in &pids {
            let first_observation = !self.registry.contains(pid);
            match sample_process(&self.source, pid, first_observation) {
                Sample::Observed(sample) => {
                    classifier::observe(&mut self.registry, pid, sample, tick);
                }
                Sample::NotAvailable => {
                    trace!("pid {} went away before sampling", pid);
                    unavailable += 1;
                }
            }
        }

        let reports = self.sweep(tick, resync);

        let outcome = CycleOutcome {
            tick,
            resync,
            reports,
            enumerated: pids.len(),
            unavailable,
            tracked: self.registry.len(),
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        debug!(
            "Cycle {} finished: {} pids, {} unavailable, {} reports, {} tracked, {:.3}ms",
            tick,
            outcome.enumerated,
            outcome.unavailable,
            outcome.reports.len(),
            outcome.tracked,
            outcome.duration_seconds * 1000.0
        );

        outcome
    }

    fn sweep(&mut self, tick: u64, resync: bool) -> Vec<Report> {
        let mut reports = Vec::new();

        for snapshot in self.registry.snapshot_ascending() {
            let pid = snapshot.pid;
            let status = classifier::sweep_status(&snapshot, tick);

            if status == ProcessStatus::Vanished {
                reports.push(Report::Old { pid });
                self.registry.remove(pid);
                continue;
            }

            let record = match self.registry.get_mut(pid) {
                Some(record) => record,
                None => continue,
            };
            if let Some(report) = Report::for_record(record, status, resync) {
                classifier::commit(record);
                reports.push(report);
            }
            classifier::reset(record);
        }

        reports
    }
}
