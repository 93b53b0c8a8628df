//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-uss-feed.yaml"));
    let content = generate_config(format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Renders the default configuration. Comments are only added to YAML.
pub fn generate_config(
    format: ConfigFormat,
    commented: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml if commented => add_config_comments(content),
        _ => content,
    })
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles USS Feed Configuration
# ===============================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 26600                  # TCP port of the change feed
# interval_ms: 1000            # Sampling period while a client is attached
# write_timeout_ms: 5000       # A stalled frame write drops the client
# resync_on_connect: true      # Report every process as new on the first cycle
#
# Process Sampling
# ----------------
# proc_root: "/proc"           # Process information root
# prefer_smaps_rollup: true    # Use smaps_rollup when the kernel provides it
#
# Performance Tuning
# ------------------
# io_buffer_kb: 4              # Buffer size for comm/status readers
# smaps_buffer_kb: 512         # Buffer size for smaps parsing
# smaps_rollup_buffer_kb: 256  # Buffer size for smaps_rollup parsing
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
