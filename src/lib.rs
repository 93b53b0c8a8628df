//! Herakles USS Feed Library
//!
//! Per-process private memory (USS) change feed. A [`cycle::SamplingCycle`]
//! samples every process through a [`process::ProcessSource`], diffs the result
//! against its [`registry::ProcessRegistry`] and produces [`report::Report`]
//! lines. [`server::FeedServer`] drives cycles for a single attached TCP client.
//!
//! # Usage
//!
//! ```no_run
//! use herakles_uss_feed::cycle::SamplingCycle;
//! use herakles_uss_feed::process::{BufferConfig, ProcFs};
//! use herakles_uss_feed::report::render_frame;
//!
//! let source = ProcFs::new("/proc", BufferConfig::default(), true);
//! let mut cycle = SamplingCycle::new(source);
//!
//! // First cycle reports every process as new, later ones only changes
//! let outcome = cycle.run(false);
//! print!("{}", render_frame(&outcome.reports));
//! ```

pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod cycle;
pub mod feed_stats;
pub mod process;
pub mod registry;
pub mod report;
pub mod server;
pub mod startup_checks;

// Re-export main types for convenience
pub use cycle::{CycleOutcome, SamplingCycle};
pub use feed_stats::FeedStats;
pub use process::{ProcFs, ProcessSource};
pub use report::Report;
pub use server::{FeedServer, ServerError, ServerOptions};
