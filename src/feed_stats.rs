//! Runtime statistics of the change feed.
//!
//! Tracks cycle performance and session bookkeeping. The table rendered by
//! [`FeedStats::render_table`] is logged when a session ends and printed by the
//! `test` subcommand.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::cycle::CycleOutcome;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Shareable wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(last, avg, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Statistics collected by the feed server.
pub struct FeedStats {
    // Cycle performance
    pub cycle_duration_ms: Stat,
    pub report_lines: Stat,
    pub tracked_processes: Stat,
    pub unavailable_processes: Stat,
    pub total_cycles: AtomicU64,
    pub resync_cycles: AtomicU64,

    // Sessions
    pub sessions_accepted: AtomicU64,
    pub connections_rejected: AtomicU64,
    pub write_failures: AtomicU64,
    pub bytes_written: AtomicU64,

    pub start_time: Instant,
}

impl Default for FeedStats {
    fn default() -> Self {
        Self {
            cycle_duration_ms: Stat::default(),
            report_lines: Stat::default(),
            tracked_processes: Stat::default(),
            unavailable_processes: Stat::default(),
            total_cycles: AtomicU64::new(0),
            resync_cycles: AtomicU64::new(0),
            sessions_accepted: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl FeedStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_cycle(&self, outcome: &CycleOutcome) {
        self.cycle_duration_ms
            .add_sample(outcome.duration_seconds * 1000.0);
        self.report_lines.add_sample(outcome.reports.len() as f64);
        self.tracked_processes.add_sample(outcome.tracked as f64);
        self.unavailable_processes
            .add_sample(outcome.unavailable as f64);
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
        if outcome.resync {
            self.resync_cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_session_accepted(&self) {
        self.sessions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_written(&self, bytes: usize) {
        self.bytes_written
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn get_uptime_hours(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() / 3600.0
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.cycle_duration_ms.snapshot();
        let (rl_cur, rl_avg, rl_max, rl_min, _) = self.report_lines.snapshot();
        let (tp_cur, tp_avg, tp_max, tp_min, _) = self.tracked_processes.snapshot();
        let (up_cur, up_avg, up_max, up_min, _) = self.unavailable_processes.snapshot();

        let total = self.total_cycles.load(Ordering::Relaxed);
        let resyncs = self.resync_cycles.load(Ordering::Relaxed);
        let accepted = self.sessions_accepted.load(Ordering::Relaxed);
        let rejected = self.connections_rejected.load(Ordering::Relaxed);
        let write_failures = self.write_failures.load(Ordering::Relaxed);
        let bytes = self.bytes_written.load(Ordering::Relaxed);

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "USS FEED - INTERNAL STATS").ok();
        writeln!(out, "=========================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "CYCLE PERFORMANCE").ok();
        writeln!(out, "-----------------").ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "cycle_duration (ms)",
            format!("{:.3}", cd_cur),
            format!("{:.3}", cd_avg),
            format!("{:.3}", cd_max),
            format!("{:.3}", cd_min),
            left = left_col,
            col = col_w
        )
        .ok();

        for (label, cur, avg, max, min) in [
            ("report_lines", rl_cur, rl_avg, rl_max, rl_min),
            ("tracked_processes", tp_cur, tp_avg, tp_max, tp_min),
            ("unavailable_processes", up_cur, up_avg, up_max, up_min),
        ] {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.0}", cur),
                format!("{:.1}", avg),
                format!("{:.0}", max),
                format!("{:.0}", min),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "SESSIONS").ok();
        writeln!(out, "--------").ok();

        for (label, value) in [
            ("sessions_accepted", accepted),
            ("connections_rejected", rejected),
            ("write_failures", write_failures),
            ("resync_cycles", resyncs),
            ("bytes_written", bytes),
        ] {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{}", value),
                "N/A",
                "N/A",
                "N/A",
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(
            out,
            "number of done cycles: {} | uptime: {:.1}h",
            total,
            self.get_uptime_hours()
        )
        .ok();

        out
    }
}
