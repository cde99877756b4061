//! HTTP surface: viewer push channel plus status and log queries
//!
//! Three read-only endpoints and one SSE stream:
//! - `GET /` serves the embedded viewer page
//! - `GET /api/status` reports monitored files (re-checked against disk per
//!   call) and the number of registered tailers
//! - `GET /api/logs/:file` returns the last 100 non-blank lines of a
//!   monitored-directory file, or 404
//! - `GET /events` is the per-viewer push channel: per-file backlog first
//!   (`initial-logs`, 50 lines per file), then live `log`/`alert` events
//!
//! [`Monitor`] assembles the whole pipeline (tailers, pump, relay, server)
//! behind one handle so the binary and the integration tests share the same
//! startup and shutdown path.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eyre::{Context, Result};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::events::{LogEvent, MonitorEvent};
use crate::history::{INITIAL_BACKLOG_LINES, QUERY_TAIL_LINES, tail_lines};
use crate::hub::{BroadcastHub, create_hub, pump};
use crate::relay::spawn_auth_relay;
use crate::tailer::{TailerSet, short_name, spawn_tailers};

/// Capacity of the single channel carrying tailed lines to the pump
const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Shared state handed to every route handler
///
/// Owned by the process entry point and torn down with it; components never
/// reach for globals.
pub struct MonitorContext {
    /// Base directory the query endpoint resolves file names against
    pub log_dir: PathBuf,
    /// Configured file paths, whether or not they existed at startup
    pub files: Vec<PathBuf>,
    pub hub: Arc<BroadcastHub>,
    /// Number of tailers registered at startup
    pub active_tails: usize,
    /// Flips to true when the monitor shuts down; open SSE streams end then
    shutdown: watch::Receiver<bool>,
}

/// Response shape of `GET /api/status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub monitored_files: Vec<String>,
    pub active_tails: usize,
}

/// Build the HTTP router over a monitor context
pub fn router(context: Arc<MonitorContext>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/api/logs/:file", get(get_log))
        .route("/events", get(events_stream))
        .with_state(context)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../../assets/index.html"))
}

async fn status(State(ctx): State<Arc<MonitorContext>>) -> Json<StatusResponse> {
    let monitored_files = ctx
        .files
        .iter()
        .filter(|path| path.exists())
        .map(|path| path.display().to_string())
        .collect();

    Json(StatusResponse {
        status: "running".to_string(),
        monitored_files,
        active_tails: ctx.active_tails,
    })
}

async fn get_log(State(ctx): State<Arc<MonitorContext>>, UrlPath(file): UrlPath<String>) -> Response {
    if file.contains('/') || file.contains("..") {
        return log_not_found();
    }

    let path = ctx.log_dir.join(&file);
    if !path.exists() {
        debug!(file, "get_log: not found");
        return log_not_found();
    }

    match tail_lines(&path, QUERY_TAIL_LINES).await {
        Ok(lines) => Json(lines).into_response(),
        Err(e) => {
            error!(file, error = %e, "get_log: read failed");
            log_not_found()
        }
    }
}

fn log_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Log file not found"})),
    )
        .into_response()
}

async fn events_stream(
    State(ctx): State<Arc<MonitorContext>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("viewer connected");

    // Subscribe before reading the backlog so nothing appended in between
    // is lost; a line may then appear in both backlog and live stream.
    let rx = ctx.hub.subscribe();

    let mut initial = Vec::new();
    for path in &ctx.files {
        if !path.exists() {
            continue;
        }
        match tail_lines(path, INITIAL_BACKLOG_LINES).await {
            Ok(lines) => {
                let file = short_name(path);
                let logs: Vec<LogEvent> = lines
                    .into_iter()
                    .map(|line| LogEvent::classify(&file, line))
                    .collect();
                initial.push(MonitorEvent::InitialLogs(logs));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "events_stream: backlog read failed");
            }
        }
    }

    let backlog = stream::iter(initial).map(|ev| Ok(sse_event(&ev)));
    let live = BroadcastStream::new(rx)
        .filter_map(|res| futures::future::ready(res.ok()))
        .map(|ev| Ok(sse_event(&ev)));

    // Viewer connections are cancelled at shutdown, not drained; an
    // unterminated stream would keep graceful shutdown waiting forever.
    let mut shutdown = ctx.shutdown.clone();
    let stopped = async move {
        let _ = shutdown.wait_for(|stopped| *stopped).await;
    };

    Sse::new(backlog.chain(live).take_until(stopped))
}

fn sse_event(event: &MonitorEvent) -> Event {
    let result = match event {
        MonitorEvent::Log(ev) => Event::default().event("log").json_data(ev),
        MonitorEvent::Alert(alert) => Event::default().event("alert").json_data(alert),
        MonitorEvent::InitialLogs(logs) => Event::default().event("initial-logs").json_data(logs),
    };
    result.expect("monitor event serializes to JSON")
}

/// Running monitor pipeline: tailers, pump, optional relay, HTTP server
pub struct Monitor {
    addr: SocketAddr,
    context: Arc<MonitorContext>,
    server: JoinHandle<()>,
    tailers: TailerSet,
    pump: JoinHandle<()>,
    relay: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Monitor {
    /// Assemble and start the whole pipeline from a loaded configuration.
    ///
    /// Binds the listen address (use port 0 for an ephemeral port), spawns
    /// one tailer per existing configured file, the classify/broadcast pump,
    /// and the auth relay when enabled.
    pub async fn start(config: Config) -> Result<Self> {
        let hub = create_hub();
        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

        let paths = config.logs.paths();
        let tailers = spawn_tailers(&paths, &line_tx).await;
        // Tailer tasks hold the remaining senders; the pump exits when the
        // last one stops.
        drop(line_tx);

        let pump_handle = tokio::spawn(pump(hub.clone(), line_rx));

        let relay = config
            .relay
            .enabled
            .then(|| spawn_auth_relay(&config.relay, &config.logs.dir, hub.clone()));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let context = Arc::new(MonitorContext {
            log_dir: config.logs.dir.clone(),
            files: paths,
            hub,
            active_tails: tailers.active,
            shutdown: shutdown_rx.clone(),
        });

        let listener = TcpListener::bind(&config.server.listen)
            .await
            .context(format!("Failed to bind {}", config.server.listen))?;
        let addr = listener.local_addr()?;

        let app = router(context.clone());
        let server = tokio::spawn(async move {
            let mut shutdown_rx = shutdown_rx;
            let shutdown = async move {
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
            };
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                error!(error = %e, "HTTP server error");
            }
        });

        info!(%addr, active_tails = tailers.active, "log monitor listening");

        Ok(Self {
            addr,
            context,
            server,
            tailers,
            pump: pump_handle,
            relay,
            shutdown_tx,
        })
    }

    /// Address the HTTP server is bound to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &Arc<MonitorContext> {
        &self.context
    }

    /// Stop the server and abort the pipeline tasks without draining
    /// in-flight lines. Open viewer streams are ended, not drained.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.server.await;

        self.tailers.abort_all();
        self.pump.abort();
        if let Some(relay) = self.relay {
            relay.abort();
        }
        info!("log monitor stopped");
    }
}
