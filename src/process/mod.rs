//! Process-related modules for reading the live process table.
//!
//! This module provides:
//! - `memory`: Private memory (USS) parsing from /proc/<pid>/smaps
//! - `scanner`: Pid discovery, process name and parent pid lookup
//! - `sampler`: The `ProcessSource` seam and per-pid sampling

pub mod memory;
pub mod sampler;
pub mod scanner;

// Re-export commonly used types
pub use memory::{parse_uss_for_process, BufferConfig};
pub use sampler::{sample_process, ProcFs, ProcSample, ProcessSource, Sample};
pub use scanner::{collect_pids, read_parent_pid, read_process_name};
