//! Wire format of the change feed.
//!
//! One line per event, fields separated by `|`:
//!
//! ```text
//! new|pid=100|ppid=1|uss=4096|name=worker
//! update|pid=100|uss=8192
//! update|pid=100|uss=8192|name=worker-2
//! old|pid=100
//! ```
//!
//! Each sampling cycle is framed by [`START_MARKER`] and [`END_MARKER`] lines.

use std::fmt;

use crate::registry::{ProcessRecord, ProcessStatus};

/// First line of every cycle frame.
pub const START_MARKER: &str = ">>>";
/// Last line of every cycle frame.
pub const END_MARKER: &str = "<<<";

/// One event of the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    New {
        pid: u32,
        ppid: u32,
        uss: u64,
        name: Option<String>,
    },
    Update {
        pid: u32,
        uss: u64,
    },
    Rename {
        pid: u32,
        uss: u64,
        name: Option<String>,
    },
    Old {
        pid: u32,
    },
}

impl Report {
    /// Builds the report for a live record from its staged values.
    ///
    /// With `resync` every record is reported as new. Idle records produce nothing.
    pub fn for_record(record: &ProcessRecord, status: ProcessStatus, resync: bool) -> Option<Self> {
        let status = if resync && status != ProcessStatus::Vanished {
            ProcessStatus::New
        } else {
            status
        };

        match status {
            ProcessStatus::New => Some(Report::New {
                pid: record.pid,
                ppid: record.ppid.unwrap_or(0),
                uss: record.sampled_uss,
                name: record.sampled_name.clone(),
            }),
            ProcessStatus::Updated => Some(Report::Update {
                pid: record.pid,
                uss: record.sampled_uss,
            }),
            ProcessStatus::Renamed => Some(Report::Rename {
                pid: record.pid,
                uss: record.sampled_uss,
                name: record.sampled_name.clone(),
            }),
            ProcessStatus::Vanished => Some(Report::Old { pid: record.pid }),
            ProcessStatus::Idle | ProcessStatus::Unknown => None,
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            Report::New { pid, .. }
            | Report::Update { pid, .. }
            | Report::Rename { pid, .. }
            | Report::Old { pid } => *pid,
        }
    }

    /// Event kind as written in the first field.
    pub fn kind(&self) -> &'static str {
        match self {
            Report::New { .. } => "new",
            Report::Update { .. } | Report::Rename { .. } => "update",
            Report::Old { .. } => "old",
        }
    }
}

/// Replaces the field separator and line terminators so a name always stays
/// inside its own field.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '|' | '\n' | '\r' => '_',
            other => other,
        })
        .collect()
}

impl fmt::Display for Report {
    /// Formats the line without its terminating newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::New {
                pid,
                ppid,
                uss,
                name,
            } => {
                write!(f, "new|pid={}|ppid={}|uss={}", pid, ppid, uss)?;
                if let Some(name) = name {
                    write!(f, "|name={}", sanitize_name(name))?;
                }
                Ok(())
            }
            Report::Update { pid, uss } => write!(f, "update|pid={}|uss={}", pid, uss),
            Report::Rename { pid, uss, name } => write!(
                f,
                "update|pid={}|uss={}|name={}",
                pid,
                uss,
                name.as_deref().map(sanitize_name).unwrap_or_default()
            ),
            Report::Old { pid } => write!(f, "old|pid={}", pid),
        }
    }
}

/// Renders one cycle's reports as a framed, newline-terminated block.
pub fn render_frame(reports: &[Report]) -> String {
    let mut out = String::with_capacity(8 + reports.len() * 48);
    out.push_str(START_MARKER);
    out.push('\n');
    for report in reports {
        out.push_str(&report.to_string());
        out.push('\n');
    }
    out.push_str(END_MARKER);
    out.push('\n');
    out
}
