//! onchange - run a shell command after a directory tree goes quiet.
//!
//! # Environment Variables
//!
//! See the [`config`](onchange::config) module for available configuration
//! options. Flags take precedence over the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use onchange::config::{Config, ConfigOverrides, LogFormat};
use onchange::event_loop::run_session;

/// Run a shell command after a directory tree goes quiet.
///
/// Watches DIR and all of its subdirectories for file creations and writes.
/// Once no change has been seen for the debounce period, COMMAND is run in
/// DIR through `sh -c` (or `cmd /C` on Windows).
#[derive(Parser, Debug)]
#[command(name = "onchange")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    ONCHANGE_DIR               Directory to watch (default: .)
    ONCHANGE_COMMAND           Command to run (default: none, log only)
    ONCHANGE_DEBOUNCE_MS       Quiet period in milliseconds (default: 5000)
    ONCHANGE_CHANNEL_CAPACITY  Notifier channel capacity (default: 1024)
    ONCHANGE_LOG_FORMAT        text or json (default: text)
    RUST_LOG                   Log filter (default: info)

EXAMPLES:
    # Log changes under the current directory
    onchange

    # Rebuild five seconds after the last save
    onchange -d ./src -c 'cargo build'

    # React faster
    onchange -c 'make test' --debounce-ms 500
")]
struct Cli {
    /// Directory to watch for changes.
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Shell command to run on file changes.
    #[arg(short, long, value_name = "COMMAND")]
    command: Option<String>,

    /// Quiet period before the command runs, in milliseconds.
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Log output format: text or json.
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format =
        LogFormat::resolve(cli.log_format.as_deref()).context("Failed to configure logging")?;
    init_logging(log_format);

    let config = Config::load(ConfigOverrides {
        dir: cli.dir,
        command: cli.command,
        debounce_ms: cli.debounce_ms,
    })
    .context("Failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let stats = runtime
        .block_on(run_session(&config, wait_for_shutdown()))
        .with_context(|| format!("Failed to watch {}", config.watch_dir.display()))?;

    info!(
        changes = stats.changes,
        qualifying = stats.qualifying,
        errors = stats.errors,
        "Watcher stopped"
    );
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
