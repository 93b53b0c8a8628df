//! Startup requirement validation for herakles-uss-feed.
//!
//! This module validates that the daemon can see the process table before it
//! starts listening.

use nix::unistd::geteuid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - memory maps of foreign processes will be skipped");
        warn!("   Recommendation: Run as root for full system monitoring");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check access to the memory map of the init process
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    if !proc_root.is_dir() {
        error!("❌ Process root {} not found", proc_root.display());
        return Err(ValidationError::ProcRootMissing(proc_root.to_path_buf()));
    }

    let init = proc_root.join("1");
    let candidates = [init.join("smaps_rollup"), init.join("smaps")];
    let Some(test_file) = candidates.iter().find(|p| p.exists()) else {
        warn!(
            "⚠️  No memory map found under {} - cannot test access",
            init.display()
        );
        return Ok(());
    };

    match fs::File::open(test_file) {
        Ok(_) => {
            info!("✅ {} access: Can read all processes", proc_root.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", test_file.display());
            error!("   Only user-owned processes will appear in the feed!");
            error!("");
            error!("   Solutions:");
            error!("   1. Run as root");
            error!("   2. Grant capabilities:");
            error!("      setcap cap_dac_read_search,cap_sys_ptrace+ep /path/to/binary");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            warn!("⚠️  Could not test {} access: {}", proc_root.display(), e);
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Process information root not found: {}", .0.display())]
    ProcRootMissing(PathBuf),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),
}
