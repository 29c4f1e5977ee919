//! Parsed session types.

use crate::error::ParseError;

/// One named buffer recovered from session text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSection {
    pub name: String,
    pub content: String,
    /// One-based line of the section's first delimiter.
    pub line: usize,
}

/// Result of a best-effort parse.
///
/// Malformed segments are left out of `buffers` and recorded in `issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSession {
    pub startup: Option<SessionSection>,
    pub buffers: Vec<SessionSection>,
    pub issues: Vec<ParseError>,
}

impl ParsedSession {
    /// True when nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Reject the parse if any segment was skipped.
    ///
    /// # Errors
    /// Returns the first issue found, in input order.
    pub fn into_strict(self) -> Result<Self, ParseError> {
        match self.issues.first() {
            Some(issue) => Err(issue.clone()),
            None => Ok(self),
        }
    }

    /// Names of the recovered non-startup buffers, in input order.
    pub fn buffer_names(&self) -> Vec<&str> {
        self.buffers.iter().map(|s| s.name.as_str()).collect()
    }
}
