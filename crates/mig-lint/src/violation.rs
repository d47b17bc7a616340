//! Lint violations and source-line location.

use serde::Serialize;
use std::fmt;

/// One rule match against one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Script name (`module/filename`).
    pub script: String,
    /// Offending statement text.
    pub statement: String,
    /// Rule name, or its alias when configured.
    pub rule: String,
    pub message: String,
    /// Offending source line, trimmed.
    pub line: String,
    /// 1-based line number of `line` within the script.
    pub line_number: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}\n    {}",
            self.script, self.line_number, self.rule, self.message, self.line
        )
    }
}

/// Find the offending line of a statement.
///
/// Returns the first line containing `needle` (case-insensitively), else the
/// first non-blank line, together with its script line number.
pub(crate) fn locate_line(text: &str, start_line: usize, needle: Option<&str>) -> (String, usize) {
    let needle = needle.map(|n| n.to_ascii_lowercase());
    if let Some(needle) = needle.as_deref().filter(|n| !n.is_empty()) {
        for (offset, line) in text.lines().enumerate() {
            if line.to_ascii_lowercase().contains(needle) {
                return (line.trim().to_string(), start_line + offset);
            }
        }
    }
    text.lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(offset, line)| (line.trim().to_string(), start_line + offset))
        .unwrap_or_else(|| (String::new(), start_line))
}
