//! Wire types for the viewer push channel
//!
//! Exactly three message kinds reach a viewer: `log` for every classified
//! line, `alert` for lines matching the critical patterns, and `initial-logs`
//! for the per-file backlog delivered once on connect. Each kind is a
//! fixed-field record; the timestamp is assigned at classification time, not
//! parsed out of the line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{LogLevel, detect_level};

/// A classified record derived from one appended line
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEvent {
    /// Short name of the source file (e.g. `production.log`)
    pub file: String,
    pub timestamp: DateTime<Utc>,
    /// Raw line text, unmodified
    pub message: String,
    pub level: LogLevel,
}

impl LogEvent {
    /// Classify a raw line from the named source file, stamping it with the
    /// current time.
    pub fn classify(file: &str, message: String) -> Self {
        let level = detect_level(&message);
        Self {
            file: file.to_string(),
            timestamp: Utc::now(),
            message,
            level,
        }
    }
}

/// Alert category tag; currently only `critical` exists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Critical,
}

/// A log event additionally flagged by the critical-pattern set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub file: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Build the alert corresponding to a log event. Every alert corresponds
    /// to exactly one log event and shares its timestamp.
    pub fn for_event(event: &LogEvent) -> Self {
        Self {
            alert_type: AlertType::Critical,
            message: event.message.clone(),
            file: event.file.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// One message on the viewer push channel
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    /// A classified line, delivered to every connected viewer
    Log(LogEvent),
    /// A critical alert, delivered alongside (not instead of) its log event
    Alert(Alert),
    /// Backlog of one monitored file, delivered once to a new viewer only
    InitialLogs(Vec<LogEvent>),
}

impl MonitorEvent {
    /// Wire name of this message kind
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorEvent::Log(_) => "log",
            MonitorEvent::Alert(_) => "alert",
            MonitorEvent::InitialLogs(_) => "initial-logs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_assigns_level_and_timestamp() {
        let before = Utc::now();
        let event = LogEvent::classify("production.log", "ERROR boom".to_string());
        let after = Utc::now();

        assert_eq!(event.file, "production.log");
        assert_eq!(event.message, "ERROR boom");
        assert_eq!(event.level, LogLevel::Error);
        assert!(event.timestamp >= before && event.timestamp <= after);
    }

    #[test]
    fn test_log_event_wire_shape() {
        let event = LogEvent::classify("auth.log", "user login ok".to_string());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["file"], "auth.log");
        assert_eq!(json["message"], "user login ok");
        assert_eq!(json["level"], "auth");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_alert_wire_shape() {
        let event = LogEvent::classify("production.log", "database error".to_string());
        let alert = Alert::for_event(&event);
        let json = serde_json::to_value(&alert).unwrap();

        assert_eq!(json["type"], "critical");
        assert_eq!(json["message"], "database error");
        assert_eq!(json["file"], "production.log");
        assert_eq!(alert.timestamp, event.timestamp);
    }

    #[test]
    fn test_event_kinds() {
        let event = LogEvent::classify("a.log", "x".to_string());
        assert_eq!(MonitorEvent::Log(event.clone()).kind(), "log");
        assert_eq!(MonitorEvent::Alert(Alert::for_event(&event)).kind(), "alert");
        assert_eq!(MonitorEvent::InitialLogs(vec![]).kind(), "initial-logs");
    }
}
