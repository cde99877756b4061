//! Line classification heuristics
//!
//! Pure functions mapping a raw log line to a severity level and to a
//! critical-event flag. Level detection is substring-based with a fixed
//! priority order; the critical test is a separate regex set and does not
//! feed back into level detection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Severity level derived from a log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Auth,
    Info,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Auth => "auth",
            LogLevel::Info => "info",
        };
        f.write_str(s)
    }
}

const ERROR_MARKERS: &[&str] = &["error", "err", "fail"];
const WARNING_MARKERS: &[&str] = &["warn"];
const AUTH_MARKERS: &[&str] = &["auth", "login"];

/// Derive the severity level of a raw log line.
///
/// Markers are checked in priority order (error > warning > auth), first
/// match wins; a line matching none of them is `info`. Priority matters:
/// "auth failed" is an error, not an auth event, because `fail` is checked
/// first.
pub fn detect_level(message: &str) -> LogLevel {
    let msg = message.to_lowercase();
    if ERROR_MARKERS.iter().any(|m| msg.contains(m)) {
        LogLevel::Error
    } else if WARNING_MARKERS.iter().any(|m| msg.contains(m)) {
        LogLevel::Warning
    } else if AUTH_MARKERS.iter().any(|m| msg.contains(m)) {
        LogLevel::Auth
    } else {
        LogLevel::Info
    }
}

static CRITICAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)authentication failed",
        r"(?i)login error",
        r"(?i)session error",
        r"(?i)database error",
        r"(?i)server error",
        r"500",
        // 404 is critical only when auth appears on the same line, in
        // either order
        r"(?i)404.*auth",
        r"(?i)auth.*404",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("critical pattern compiles"))
    .collect()
});

/// Whether a raw log line matches the fixed critical-event pattern set.
///
/// Independent of [`detect_level`]: a critical line still carries whatever
/// level the markers give it.
pub fn is_critical(message: &str) -> bool {
    CRITICAL_PATTERNS.iter().any(|p| p.is_match(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_level_error_markers() {
        assert_eq!(detect_level("ERROR boom"), LogLevel::Error);
        assert_eq!(detect_level("something errored out"), LogLevel::Error);
        assert_eq!(detect_level("request failed"), LogLevel::Error);
    }

    #[test]
    fn test_detect_level_priority_error_beats_auth() {
        // "fail" is checked before "auth", so this is an error, not auth
        assert_eq!(detect_level("auth failed for user"), LogLevel::Error);
        assert_eq!(detect_level("login error for user"), LogLevel::Error);
    }

    #[test]
    fn test_detect_level_warning() {
        assert_eq!(detect_level("WARN disk almost full"), LogLevel::Warning);
        assert_eq!(detect_level("warning: deprecated"), LogLevel::Warning);
    }

    #[test]
    fn test_detect_level_auth() {
        assert_eq!(detect_level("user login successful"), LogLevel::Auth);
        assert_eq!(detect_level("auth token refreshed"), LogLevel::Auth);
    }

    #[test]
    fn test_detect_level_info_default() {
        assert_eq!(detect_level("GET /dashboard 200"), LogLevel::Info);
        assert_eq!(detect_level(""), LogLevel::Info);
    }

    #[test]
    fn test_detect_level_case_insensitive() {
        assert_eq!(detect_level("FATAL ERROR"), LogLevel::Error);
        assert_eq!(detect_level("Login attempt"), LogLevel::Auth);
    }

    #[test]
    fn test_is_critical_named_patterns() {
        assert!(is_critical("Authentication failed for admin"));
        assert!(is_critical("login error: bad password"));
        assert!(is_critical("session error: expired"));
        assert!(is_critical("database error: connection refused"));
        assert!(is_critical("Internal Server Error"));
    }

    #[test]
    fn test_is_critical_500() {
        assert!(is_critical("GET /api/accounts 500"));
    }

    #[test]
    fn test_is_critical_404_requires_auth_cooccurrence() {
        // Either ordering on the line counts
        assert!(is_critical("GET /api/auth 404"));
        assert!(is_critical("404 on auth callback"));
        assert!(!is_critical("GET /api/widgets 404"));
        assert!(!is_critical("auth token refreshed"));
    }

    #[test]
    fn test_is_critical_plain_lines() {
        assert!(!is_critical("INFO start"));
        assert!(!is_critical("user login successful"));
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LogLevel::Error).unwrap(), "\"error\"");
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
        assert_eq!(serde_json::to_string(&LogLevel::Auth).unwrap(), "\"auth\"");
        assert_eq!(serde_json::to_string(&LogLevel::Info).unwrap(), "\"info\"");
    }
}
