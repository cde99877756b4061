//! File Tailer - per-file append detection and line delivery
//!
//! One tailer owns one monitored file: a byte cursor starting at end-of-file
//! and a filesystem watch (via `notify`) that wakes it when the file changes.
//! Appended bytes are read from the cursor, split into complete lines, and
//! sent into the shared line channel in append order. A trailing fragment
//! without a newline stays buffered until the newline arrives, so no line is
//! ever delivered partially or twice.
//!
//! Files missing at registration are skipped and never retried. A tailer
//! that hits an I/O error logs it and stops permanently; the rest of the
//! pipeline keeps running.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One complete line captured from a monitored file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailedLine {
    /// Short name of the source file (e.g. `production.log`)
    pub file: String,
    pub line: String,
}

#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Tails a single file, delivering appended lines in order
pub struct FileTailer {
    path: PathBuf,
    name: String,
    /// Byte offset of the next unread position
    pos: u64,
    /// Trailing bytes of an incomplete final line
    partial: String,
    /// Keeps the filesystem watch registered for the tailer's lifetime
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
}

impl FileTailer {
    /// Register a tailer for an existing file, starting at its current end.
    ///
    /// Fails if the file does not exist or the watch cannot be registered.
    pub async fn register(path: impl Into<PathBuf>) -> Result<Self, TailError> {
        let path = path.into();

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // The receiver only goes away when the tailer stops; nothing to
            // do with an event after that.
            let _ = tx.send(res);
        })
        .map_err(|source| TailError::Watch {
            path: path.clone(),
            source,
        })?;

        watcher
            .watch(&path, RecursiveMode::NonRecursive)
            .map_err(|source| TailError::Watch {
                path: path.clone(),
                source,
            })?;

        // Length is read after the watch is live, so an append racing with
        // registration lands behind the cursor and raises an event.
        let len = tokio::fs::metadata(&path).await?.len();

        let name = short_name(&path);
        debug!(path = %path.display(), %name, start_offset = len, "FileTailer::register");

        Ok(Self {
            path,
            name,
            pos: len,
            partial: String::new(),
            _watcher: watcher,
            events,
        })
    }

    /// Short name of the monitored file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the tailer until the watch closes, the line channel is dropped,
    /// or an unrecoverable I/O error occurs. No retry is attempted after an
    /// error; the tailer for this file stays inactive until restart.
    pub async fn run(mut self, tx: mpsc::Sender<TailedLine>) {
        loop {
            match self.events.recv().await {
                None => {
                    debug!(file = %self.name, "tailer: watch closed, exiting");
                    break;
                }
                Some(Err(e)) => {
                    error!(file = %self.name, error = %e, "tailer: watch error, stopping");
                    break;
                }
                Some(Ok(event)) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        continue;
                    }
                    match self.read_appended().await {
                        Ok(lines) => {
                            for line in lines {
                                let tailed = TailedLine {
                                    file: self.name.clone(),
                                    line,
                                };
                                if tx.send(tailed).await.is_err() {
                                    debug!(file = %self.name, "tailer: line channel closed, exiting");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            error!(file = %self.name, error = %e, "tailer: read error, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Read everything between the cursor and end-of-file, returning the
    /// complete lines it contains. Resets to offset 0 if the file shrank.
    async fn read_appended(&mut self) -> std::io::Result<Vec<String>> {
        let file = File::open(&self.path).await?;
        let len = file.metadata().await?.len();

        if len < self.pos {
            debug!(file = %self.name, old_pos = self.pos, new_len = len, "tailer: file shrank, resetting cursor");
            self.pos = 0;
            self.partial.clear();
        }
        if len == self.pos {
            return Ok(Vec::new());
        }

        let mut file = file;
        file.seek(SeekFrom::Start(self.pos)).await?;
        let mut buf = Vec::with_capacity((len - self.pos) as usize);
        let read = file.take(len - self.pos).read_to_end(&mut buf).await?;
        self.pos += read as u64;

        self.partial.push_str(&String::from_utf8_lossy(&buf));

        let mut lines = Vec::new();
        while let Some(nl) = self.partial.find('\n') {
            let mut line: String = self.partial.drain(..=nl).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        Ok(lines)
    }
}

/// Handles for the set of spawned tailer tasks
pub struct TailerSet {
    /// Number of files registered for tailing at startup
    pub active: usize,
    handles: Vec<JoinHandle<()>>,
}

impl TailerSet {
    /// Abort all tailer tasks without draining in-flight lines
    pub fn abort_all(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Register and spawn one tailer per configured file.
///
/// Files missing at startup are skipped silently (no tailer, no retry);
/// registration failures on existing files are logged and skipped.
pub async fn spawn_tailers(paths: &[PathBuf], tx: &mpsc::Sender<TailedLine>) -> TailerSet {
    let mut handles = Vec::new();

    for path in paths {
        if !path.exists() {
            debug!(path = %path.display(), "spawn_tailers: file missing at startup, skipping");
            continue;
        }
        match FileTailer::register(path.clone()).await {
            Ok(tailer) => {
                info!(path = %path.display(), "tailing log file");
                handles.push(tokio::spawn(tailer.run(tx.clone())));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "spawn_tailers: registration failed, skipping");
            }
        }
    }

    TailerSet {
        active: handles.len(),
        handles,
    }
}

/// Short name of a monitored file path
pub fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
