//! Structured JSON logger
//!
//! Every event is one JSON object on one line. The `event` key comes first,
//! then `severity`, then the caller's fields in alphabetical order, so the
//! same event always renders to the same bytes.

use std::fmt;
use std::io::{self, Write};

use serde_json::Value;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-stage detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger
pub struct Logger;

impl Logger {
    /// Renders one event as a single JSON line (without the trailing newline)
    pub fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":");
        line.push_str(&Value::from(event).to_string());
        line.push_str(",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (key, value) in sorted {
            line.push(',');
            line.push_str(&Value::from(*key).to_string());
            line.push(':');
            line.push_str(&Value::from(*value).to_string());
        }

        line.push('}');
        line
    }

    fn write_line<W: Write>(writer: &mut W, line: &str) {
        // Single write_all so a line is never interleaved
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.write_all(b"\n");
        let _ = writer.flush();
    }

    /// Log an event to stdout
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::write_line(&mut io::stdout(), &Self::render(severity, event, fields));
    }

    /// Log at TRACE level
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level (stderr)
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::write_line(
            &mut io::stderr(),
            &Self::render(Severity::Error, event, fields),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_valid_json() {
        let line = Logger::render(Severity::Info, "QUERY_COMPLETE", &[("rows", "42")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "QUERY_COMPLETE");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["rows"], "42");
    }

    #[test]
    fn test_event_renders_first() {
        let line = Logger::render(Severity::Info, "A_EVENT", &[("aaa", "1")]);
        assert!(line.find("\"event\"").unwrap() < line.find("\"severity\"").unwrap());
        assert!(line.find("\"severity\"").unwrap() < line.find("\"aaa\"").unwrap());
    }

    #[test]
    fn test_fields_sorted_deterministically() {
        let a = Logger::render(
            Severity::Trace,
            "E",
            &[("zebra", "1"), ("apple", "2"), ("mango", "3")],
        );
        let b = Logger::render(
            Severity::Trace,
            "E",
            &[("mango", "3"), ("zebra", "1"), ("apple", "2")],
        );
        assert_eq!(a, b);
        assert!(a.find("apple").unwrap() < a.find("mango").unwrap());
        assert!(a.find("mango").unwrap() < a.find("zebra").unwrap());
    }

    #[test]
    fn test_special_characters_escaped() {
        let line = Logger::render(Severity::Warn, "E", &[("msg", "a \"quoted\"\nline")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "a \"quoted\"\nline");
    }

    #[test]
    fn test_single_line() {
        let line = Logger::render(Severity::Info, "E", &[("a", "1"), ("b", "2")]);
        assert!(!line.contains('\n'));
    }
}
