//! LogMonitor - streaming log monitor for the admin dashboard
//!
//! Binary entry point: parses the CLI, loads configuration, starts the
//! monitor pipeline and serves until SIGINT/SIGTERM.

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use logmonitor::cli::Cli;
use logmonitor::config::Config;
use logmonitor::server::Monitor;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    // Default INFO, overridable via --log-level or RUST_LOG
    let level = if let Some(s) = cli_log_level {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(listen) = cli.listen {
        debug!(%listen, "main: listen address overridden from CLI");
        config.server.listen = listen;
    }

    info!(
        listen = %config.server.listen,
        dir = %config.logs.dir.display(),
        files = config.logs.files.len(),
        "LogMonitor starting"
    );

    let monitor = Monitor::start(config).await.context("Failed to start monitor")?;

    // Wait for a shutdown signal
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                warn!("SIGINT received");
            }
            _ = sigterm.recv() => {
                warn!("SIGTERM received");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        warn!("Ctrl+C received");
    }

    info!("Shutting down...");
    monitor.shutdown().await;

    Ok(())
}
