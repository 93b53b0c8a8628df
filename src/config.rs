//! Configuration management for herakles-uss-feed.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use crate::process::BufferConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 26600;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_PROC_ROOT: &str = "/proc";

const DEFAULT_LOCATIONS: [&str; 6] = [
    "/etc/herakles/uss-feed.yaml",
    "/etc/herakles/uss-feed.yml",
    "/etc/herakles/uss-feed.json",
    "./herakles-uss-feed.yaml",
    "./herakles-uss-feed.yml",
    "./herakles-uss-feed.json",
];

/// Daemon configuration. Every field is optional so that partial files merge
/// over the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub bind: Option<String>,
    pub port: Option<u16>,
    #[serde(alias = "interval-ms")]
    pub interval_ms: Option<u64>,
    #[serde(alias = "write-timeout-ms")]
    pub write_timeout_ms: Option<u64>,
    #[serde(alias = "resync-on-connect")]
    pub resync_on_connect: Option<bool>,

    // Process sampling
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "prefer-smaps-rollup")]
    pub prefer_smaps_rollup: Option<bool>,

    // Performance tuning
    pub io_buffer_kb: Option<usize>,
    pub smaps_buffer_kb: Option<usize>,
    pub smaps_rollup_buffer_kb: Option<usize>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let buffers = BufferConfig::default();
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            write_timeout_ms: Some(DEFAULT_WRITE_TIMEOUT_MS),
            resync_on_connect: Some(true),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            prefer_smaps_rollup: Some(true),
            io_buffer_kb: Some(buffers.io_kb),
            smaps_buffer_kb: Some(buffers.smaps_kb),
            smaps_rollup_buffer_kb: Some(buffers.smaps_rollup_kb),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    /// Merges `other` over `self`: every field set in `other` wins.
    fn merge(mut self, other: Config) -> Config {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            bind,
            port,
            interval_ms,
            write_timeout_ms,
            resync_on_connect,
            proc_root,
            prefer_smaps_rollup,
            io_buffer_kb,
            smaps_buffer_kb,
            smaps_rollup_buffer_kb,
            log_level
        );
        self
    }

    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.unwrap_or(DEFAULT_WRITE_TIMEOUT_MS))
    }

    pub fn resync_on_connect(&self) -> bool {
        self.resync_on_connect.unwrap_or(true)
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn prefer_smaps_rollup(&self) -> bool {
        self.prefer_smaps_rollup.unwrap_or(true)
    }

    pub fn buffer_config(&self) -> BufferConfig {
        let defaults = BufferConfig::default();
        BufferConfig {
            io_kb: self.io_buffer_kb.unwrap_or(defaults.io_kb),
            smaps_kb: self.smaps_buffer_kb.unwrap_or(defaults.smaps_kb),
            smaps_rollup_kb: self
                .smaps_rollup_buffer_kb
                .unwrap_or(defaults.smaps_rollup_kb),
        }
    }

    /// Effective log level; unknown names fall back to info.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}', expected an IP address", bind).into());
        }
    }

    if cfg.interval_ms == Some(0) {
        return Err("interval_ms must be greater than 0".into());
    }

    if cfg.write_timeout_ms == Some(0) {
        return Err("write_timeout_ms must be greater than 0".into());
    }

    for (name, value) in [
        ("io_buffer_kb", cfg.io_buffer_kb),
        ("smaps_buffer_kb", cfg.smaps_buffer_kb),
        ("smaps_rollup_buffer_kb", cfg.smaps_rollup_buffer_kb),
    ] {
        if value == Some(0) {
            return Err(format!("{} must be greater than 0", name).into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            return Err(format!(
                "Invalid log_level '{}', expected one of off/error/warn/info/debug/trace",
                level
            )
            .into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = Some(interval_ms);
    }
    if let Some(write_timeout_ms) = args.write_timeout_ms {
        config.write_timeout_ms = Some(write_timeout_ms);
    }
    if args.no_resync_on_connect {
        config.resync_on_connect = Some(false);
    }

    if let Some(proc_root) = &args.proc_root {
        config.proc_root = Some(proc_root.clone());
    }
    if args.no_smaps_rollup {
        config.prefer_smaps_rollup = Some(false);
    }

    // Performance settings
    if let Some(io_buffer_kb) = args.io_buffer_kb {
        config.io_buffer_kb = Some(io_buffer_kb);
    }
    if let Some(smaps_buffer_kb) = args.smaps_buffer_kb {
        config.smaps_buffer_kb = Some(smaps_buffer_kb);
    }
    if let Some(smaps_rollup_buffer_kb) = args.smaps_rollup_buffer_kb {
        config.smaps_rollup_buffer_kb = Some(smaps_rollup_buffer_kb);
    }

    Ok(config)
}

/// Finds the first existing default config file.
pub fn find_default_config() -> Option<PathBuf> {
    DEFAULT_LOCATIONS
        .iter()
        .find(|p| Path::new(p).exists())
        .map(PathBuf::from)
}

/// Loads a config file (explicit path or first default location) merged over
/// the defaults. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path.map(PathBuf::from).or_else(find_default_config) {
        Some(p) if p.exists() => p,
        _ => return Ok(Config::default()),
    };

    let content = fs::read_to_string(&path)?;

    let user: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            config
        }
        Some("toml") => {
            let config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            config
        }
        _ => {
            // Default to YAML
            let config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            config
        }
    };

    Ok(Config::default().merge(user))
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
    user_config: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = render_config(config, format)?;

    if user_config {
        println!("User configuration (effective values):");
    }
    println!("{output}");
    Ok(())
}
