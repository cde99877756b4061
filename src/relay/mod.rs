//! Auth Relay - mirrors auth-relevant traffic into the auth log
//!
//! The relay subscribes to the broadcast hub and watches log events from one
//! source file (the production log by default). Lines matching the auth,
//! error, or api pattern groups are appended to the auth log as annotated
//! entries of the form `[<timestamp>] <TAG>: <message>`. Appends are
//! best-effort: failures are logged and swallowed, never surfaced to the
//! pipeline.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::RelayConfig;
use crate::events::{LogEvent, MonitorEvent};
use crate::hub::BroadcastHub;

const AUTH_MARKERS: &[&str] = &[
    "auth", "login", "signin", "session", "credential", "nextauth", "jwt", "token",
];
const ERROR_MARKERS: &[&str] = &[
    "error", "err", "fail", "exception", "500", "404", "unauthorized", "forbidden",
];
const API_MARKERS: &[&str] = &[
    "get /api", "post /api", "put /api", "delete /api", "api/auth", "callback", "providers", "csrf",
];

/// Background consumer mirroring matching events into the auth log
pub struct AuthRelay {
    /// Short name of the file whose events are mirrored
    source: String,
    /// File annotated lines are appended to
    target: PathBuf,
}

impl AuthRelay {
    pub fn new(source: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Annotated lines to append for one event, one per matching group
    fn annotate(event: &LogEvent) -> Vec<String> {
        let msg = event.message.to_lowercase();
        let ts = event.timestamp.to_rfc3339();
        let mut out = Vec::new();

        if AUTH_MARKERS.iter().any(|m| msg.contains(m)) {
            out.push(format!("[{ts}] AUTH_EVENT: {}", event.message.trim()));
        }
        if ERROR_MARKERS.iter().any(|m| msg.contains(m)) {
            out.push(format!("[{ts}] ERROR: {}", event.message.trim()));
        }
        if API_MARKERS.iter().any(|m| msg.contains(m)) {
            out.push(format!("[{ts}] API: {}", event.message.trim()));
        }
        out
    }

    fn append_line(&self, line: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.target)
            .and_then(|mut file| writeln!(file, "{line}"));

        if let Err(e) = result {
            error!(target = %self.target.display(), error = %e, "AuthRelay: append failed");
        }
    }

    /// Run the relay, consuming hub events until the hub is dropped.
    ///
    /// Takes an already-subscribed receiver so no event emitted between
    /// subscription and the first poll is missed. Meant to be spawned as a
    /// background task.
    pub async fn run(self, mut rx: broadcast::Receiver<MonitorEvent>) {
        debug!(source = %self.source, target = %self.target.display(), "AuthRelay::run: starting");

        loop {
            match rx.recv().await {
                Ok(MonitorEvent::Log(event)) if event.file == self.source => {
                    for line in Self::annotate(&event) {
                        self.append_line(&line);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "AuthRelay: lagged behind, missed events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("AuthRelay: channel closed, shutting down");
                    break;
                }
            }
        }
    }
}

/// Spawn the auth relay as a background task, subscribed as of this call
pub fn spawn_auth_relay(
    config: &RelayConfig,
    log_dir: &Path,
    hub: Arc<BroadcastHub>,
) -> JoinHandle<()> {
    let relay = AuthRelay::new(&config.source_file, log_dir.join(&config.target_file));
    let rx = hub.subscribe();
    tokio::spawn(relay.run(rx))
}
