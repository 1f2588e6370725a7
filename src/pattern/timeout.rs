use super::{compile, PatternError};
use crate::model::LogLine;
use regex::Regex;

/// Phrase the function runtime writes when an invocation exceeds its time limit.
pub const DEFAULT_TIMEOUT_PATTERN: &str = "Task timed out";

/// Counts log lines whose message contains the timeout pattern.
///
/// Matching is case-sensitive and unanchored, so the pattern may appear
/// anywhere in the message.
#[derive(Debug, Clone)]
pub struct TimeoutCounter {
    pattern: Regex,
}

impl TimeoutCounter {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: compile(pattern)?,
        })
    }

    pub fn count(&self, lines: &[LogLine]) -> u64 {
        lines
            .iter()
            .filter(|line| self.pattern.is_match(&line.message))
            .count() as u64
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(message: &str) -> LogLine {
        LogLine::new("id", 0, message)
    }

    fn counter() -> TimeoutCounter {
        TimeoutCounter::new(DEFAULT_TIMEOUT_PATTERN).unwrap()
    }

    #[test]
    fn test_counts_matching_lines() {
        let lines = vec![
            line("[ERROR] Task timed out"),
            line("2024-01-01T00:00:00.000Z abc Task timed out after 6.01 seconds"),
            line("[ERROR] Fatal error"),
        ];
        assert_eq!(counter().count(&lines), 2);
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(counter().count(&[]), 0);
    }

    #[test]
    fn test_no_match_is_zero() {
        let lines = vec![
            line("[ERROR] First test message"),
            line("[ERROR] Second test message"),
        ];
        assert_eq!(counter().count(&lines), 0);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let lines = vec![line("task timed out"), line("TASK TIMED OUT")];
        assert_eq!(counter().count(&lines), 0);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = TimeoutCounter::new("(unclosed").unwrap_err();
        assert!(matches!(err, PatternError::RegexCompilation { .. }));
    }
}
