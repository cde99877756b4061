//! Broadcast Hub - fan-out of monitor events to connected viewers
//!
//! The hub wraps a tokio broadcast channel. Tailers feed raw lines into a
//! single mpsc channel; the [`pump`] task classifies each line and emits the
//! resulting events to every subscriber. Viewers subscribe on connect and
//! deregister by dropping their receiver; the hub keeps no per-viewer state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::classify::is_critical;
use crate::events::{Alert, LogEvent, MonitorEvent};
use crate::tailer::TailedLine;

/// Default channel capacity (events). Viewers that lag further than this
/// behind the pump lose the oldest events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Central fan-out point for monitor events
///
/// Cheap to share behind an `Arc`; emitting with no subscribers is a no-op.
pub struct BroadcastHub {
    tx: broadcast::Sender<MonitorEvent>,
}

impl BroadcastHub {
    /// Create a hub with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a hub with the default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all connected viewers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: MonitorEvent) {
        debug!(kind = event.kind(), "BroadcastHub::emit");
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe a new viewer
    ///
    /// The receiver sees every event emitted after this call; events emitted
    /// before subscription are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        debug!("BroadcastHub::subscribe: new viewer");
        self.tx.subscribe()
    }

    /// Number of currently connected viewers
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Create a hub wrapped in an `Arc` for shared ownership
pub fn create_hub() -> Arc<BroadcastHub> {
    Arc::new(BroadcastHub::with_default_capacity())
}

/// Consume tailed lines, classify them, and broadcast the results.
///
/// Runs until every line sender is dropped. Each line becomes exactly one
/// `log` event; lines matching the critical patterns additionally produce an
/// `alert` immediately after their log event. Lines arrive on a single
/// channel, so per-file order is preserved and cross-file order is arrival
/// order.
pub async fn pump(hub: Arc<BroadcastHub>, mut lines: mpsc::Receiver<TailedLine>) {
    debug!("pump: starting");
    while let Some(tailed) = lines.recv().await {
        let event = LogEvent::classify(&tailed.file, tailed.line);
        let critical = is_critical(&event.message);
        debug!(file = %event.file, level = %event.level, critical, "pump: broadcasting line");

        if critical {
            let alert = Alert::for_event(&event);
            hub.emit(MonitorEvent::Log(event));
            hub.emit(MonitorEvent::Alert(alert));
        } else {
            hub.emit(MonitorEvent::Log(event));
        }
    }
    debug!("pump: line channel closed, exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LogLevel;
    use tokio::sync::broadcast::error::TryRecvError;

    fn line(file: &str, text: &str) -> TailedLine {
        TailedLine {
            file: file.to_string(),
            line: text.to_string(),
        }
    }

    #[test]
    fn test_hub_creation() {
        let hub = BroadcastHub::new(16);
        assert_eq!(hub.viewer_count(), 0);
    }

    #[test]
    fn test_hub_subscribe_counts_viewers() {
        let hub = BroadcastHub::new(16);
        let rx1 = hub.subscribe();
        assert_eq!(hub.viewer_count(), 1);
        let _rx2 = hub.subscribe();
        assert_eq!(hub.viewer_count(), 2);
        drop(rx1);
        assert_eq!(hub.viewer_count(), 1);
    }

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let hub = BroadcastHub::new(16);
        hub.emit(MonitorEvent::InitialLogs(vec![]));
    }

    #[tokio::test]
    async fn test_pump_classifies_and_broadcasts_in_order() {
        let hub = create_hub();
        let mut rx = hub.subscribe();
        let (tx, lines) = mpsc::channel(8);

        let pump_handle = tokio::spawn(pump(hub.clone(), lines));

        tx.send(line("production.log", "INFO start")).await.unwrap();
        tx.send(line("production.log", "ERROR boom")).await.unwrap();
        drop(tx);

        let first = rx.recv().await.unwrap();
        match first {
            MonitorEvent::Log(ev) => {
                assert_eq!(ev.message, "INFO start");
                assert_eq!(ev.level, LogLevel::Info);
            }
            other => panic!("expected log event, got {}", other.kind()),
        }

        let second = rx.recv().await.unwrap();
        match second {
            MonitorEvent::Log(ev) => {
                assert_eq!(ev.message, "ERROR boom");
                assert_eq!(ev.level, LogLevel::Error);
            }
            other => panic!("expected log event, got {}", other.kind()),
        }

        pump_handle.await.unwrap();

        // No further events; the channel only closes once the last hub
        // handle is gone
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        drop(hub);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Closed)));
    }

    #[tokio::test]
    async fn test_pump_emits_alert_after_critical_line() {
        let hub = create_hub();
        let mut rx = hub.subscribe();
        let (tx, lines) = mpsc::channel(8);

        tokio::spawn(pump(hub.clone(), lines));
        tx.send(line("production.log", "database error: down")).await.unwrap();

        let log = rx.recv().await.unwrap();
        assert_eq!(log.kind(), "log");

        let alert = rx.recv().await.unwrap();
        match alert {
            MonitorEvent::Alert(a) => {
                assert_eq!(a.message, "database error: down");
                assert_eq!(a.file, "production.log");
            }
            other => panic!("expected alert, got {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_all_viewers_receive_every_event() {
        let hub = create_hub();
        let mut rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();
        let (tx, lines) = mpsc::channel(8);

        tokio::spawn(pump(hub.clone(), lines));
        tx.send(line("auth.log", "user login ok")).await.unwrap();

        let ev1 = rx1.recv().await.unwrap();
        let ev2 = rx2.recv().await.unwrap();
        assert_eq!(ev1.kind(), "log");
        assert_eq!(ev2.kind(), "log");
    }

    #[tokio::test]
    async fn test_dropped_viewer_does_not_disturb_others() {
        let hub = create_hub();
        let rx1 = hub.subscribe();
        let mut rx2 = hub.subscribe();
        let (tx, lines) = mpsc::channel(8);

        tokio::spawn(pump(hub.clone(), lines));

        drop(rx1);
        tx.send(line("production.log", "still flowing")).await.unwrap();

        let ev = rx2.recv().await.unwrap();
        match ev {
            MonitorEvent::Log(ev) => assert_eq!(ev.message, "still flowing"),
            other => panic!("expected log event, got {}", other.kind()),
        }
    }
}
