//! LogMonitor - streaming log monitor for the admin dashboard
//!
//! LogMonitor tails a fixed set of append-only log files, classifies every
//! appended line into a leveled log event, and broadcasts events (plus
//! critical alerts) to all connected dashboard viewers over a server-push
//! channel. A small synchronous API exposes monitor status and on-demand
//! tails of the monitored files.
//!
//! # Pipeline
//!
//! One [`tailer::FileTailer`] task per monitored file feeds a single line
//! channel. The hub pump classifies each line and fans it out through a
//! [`hub::BroadcastHub`]; every viewer connection is one subscriber. Per-file
//! append order is preserved end to end; ordering across files is arrival
//! order only.
//!
//! # Modules
//!
//! - [`tailer`] - per-file append detection and line delivery
//! - [`classify`] - line level heuristics and critical-pattern matching
//! - [`hub`] - broadcast fan-out to viewer connections
//! - [`server`] - HTTP surface: push channel, status and log queries
//! - [`relay`] - mirrors auth-relevant production traffic into the auth log
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod classify;
pub mod cli;
pub mod config;
pub mod events;
pub mod history;
pub mod hub;
pub mod relay;
pub mod server;
pub mod tailer;

// Re-export commonly used types
pub use classify::{LogLevel, detect_level, is_critical};
pub use config::{Config, LogsConfig, RelayConfig, ServerConfig};
pub use events::{Alert, AlertType, LogEvent, MonitorEvent};
pub use history::{INITIAL_BACKLOG_LINES, QUERY_TAIL_LINES, tail_lines};
pub use hub::{BroadcastHub, create_hub, pump};
pub use relay::{AuthRelay, spawn_auth_relay};
pub use server::{Monitor, MonitorContext, StatusResponse};
pub use tailer::{FileTailer, TailError, TailedLine, TailerSet, spawn_tailers};
