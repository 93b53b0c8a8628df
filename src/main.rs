//! herakles-uss-feed - version 0.1.0
//!
//! Per-process USS change feed with tracing logging.
//! This is the main entry point that starts the feed server and handles subcommands.

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

use herakles_uss_feed::cli::{Args, Commands, LogLevel};
use herakles_uss_feed::commands::{command_check, command_config, command_test};
use herakles_uss_feed::config::{
    load_config, resolve_config, show_config, validate_effective_config, Config,
};
use herakles_uss_feed::process::ProcFs;
use herakles_uss_feed::server::{self, FeedServer, ServerOptions};
use herakles_uss_feed::startup_checks;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let level = config.log_level();
    let filter = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", level.as_str());
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.show_user_config || args.check_config {
        if args.check_config {
            let config = resolve_config(&args)?;
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        if args.show_config {
            let config = resolve_config(&args)?;
            return show_config(&config, args.config_format, false);
        }

        if args.show_user_config {
            let config = load_config(args.config.as_deref())?;
            if let Some(path) = &args.config {
                println!("Config file: {}", path.display());
            }
            return show_config(&config, args.config_format, true);
        }
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        match command {
            Commands::Config {
                output,
                format,
                commented,
            } => {
                return command_config(output.clone(), *format, *commented);
            }
            Commands::Check { memory, proc, all } => {
                let config = resolve_config(&args)?;
                return command_check(*memory, *proc, *all, &config);
            }
            Commands::Test {
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                return command_test(*iterations, *verbose, &config);
            }
        }
    }

    let config = load_validated_config(&args)?;

    setup_logging(&config);

    info!(
        "Starting herakles-uss-feed {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP")
    );

    let proc_root = config.proc_root();
    if let Err(e) = startup_checks::validate_requirements(&proc_root) {
        error!("❌ Startup validation failed: {}", e);
        error!("   The feed will start but may not report all processes!");
    }

    let listener = server::bind(config.bind_addr(), config.port())?;
    let source = ProcFs::new(
        proc_root,
        config.buffer_config(),
        config.prefer_smaps_rollup(),
    );
    let feed = FeedServer::new(listener, source, ServerOptions::from_config(&config));

    info!(
        "herakles-uss-feed listening on tcp://{}",
        feed.local_addr()?
    );

    tokio::select! {
        _ = feed.run() => {}
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("herakles-uss-feed stopped");
    Ok(())
}
