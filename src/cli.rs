//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// LogMonitor - streaming log monitor for the admin dashboard
#[derive(Parser)]
#[command(
    name = "logmon",
    about = "Tails dashboard log files and broadcasts classified events to viewers",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Listen address, overrides the config file
    #[arg(long, help = "Listen address (host:port)")]
    pub listen: Option<String>,
}
