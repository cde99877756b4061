//! Bounded tail reads of monitored files
//!
//! Two independent call sites use these reads with different caps: the
//! backlog sent to a newly connected viewer (50 lines per file) and the
//! on-demand query endpoint (100 lines). Both take the last N raw lines
//! first and filter blank lines afterwards, so the result can be shorter
//! than the cap.

use std::path::Path;

/// Backlog cap for a newly connected viewer, per file
pub const INITIAL_BACKLOG_LINES: usize = 50;

/// Tail cap for the on-demand log query endpoint
pub const QUERY_TAIL_LINES: usize = 100;

/// Read the last `limit` lines of `path`, blank lines filtered, in original
/// order. Errors if the file cannot be read.
pub async fn tail_lines(path: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    // lines() drops the artifact of the trailing newline, so a terminated
    // N-line file really has N candidate lines
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(limit);

    Ok(lines[start..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_tail_lines_returns_last_n_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let content: String = (1..=150).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, content).unwrap();

        let lines = tail_lines(&path, 100).await.unwrap();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines.first().unwrap(), "line 51");
        assert_eq!(lines.last().unwrap(), "line 150");
    }

    #[tokio::test]
    async fn test_tail_lines_short_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.log");
        std::fs::write(&path, "a\nb\n").unwrap();

        let lines = tail_lines(&path, 50).await.unwrap();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_tail_lines_filters_blanks_after_capping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gaps.log");
        std::fs::write(&path, "one\n\n  \ntwo\n").unwrap();

        // Blank lines count against the window but are not returned
        let lines = tail_lines(&path, 3).await.unwrap();
        assert_eq!(lines, vec!["two"]);

        let lines = tail_lines(&path, 10).await.unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_tail_lines_trailing_newline_does_not_eat_a_slot() {
        let dir = tempdir().unwrap();

        let terminated = dir.path().join("terminated.log");
        std::fs::write(&terminated, "a\nb\nc\n").unwrap();
        assert_eq!(tail_lines(&terminated, 2).await.unwrap(), vec!["b", "c"]);

        let unterminated = dir.path().join("unterminated.log");
        std::fs::write(&unterminated, "a\nb\nc").unwrap();
        assert_eq!(tail_lines(&unterminated, 2).await.unwrap(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_tail_lines_missing_file_errors() {
        let dir = tempdir().unwrap();
        let result = tail_lines(&dir.path().join("absent.log"), 10).await;
        assert!(result.is_err());
    }
}
