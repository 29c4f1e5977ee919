//! Error types shared across the crate.
//!
//! In-memory operations on managers never fail with an error: unknown ids
//! and refused operations are logged and reported through `bool` or
//! `Option` returns. Errors only surface at the boundaries, when parsing a
//! session strictly, decoding JSON, or talking to a collaborator.

use thiserror::Error;

/// A malformed part of a session text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Text before the first block is not a startup block.
    #[error("line {line}: expected a STARTUP_FILE block")]
    MissingStartupHeader { line: usize },
    /// A block header is not followed by its closing rule.
    #[error("line {line}: block header for `{name}` is not closed")]
    UnclosedHeader { line: usize, name: String },
    /// A block header carries no buffer name.
    #[error("line {line}: block header has an empty name")]
    EmptyName { line: usize },
}

impl ParseError {
    /// One-based line number the problem was found on.
    pub const fn line(&self) -> usize {
        match self {
            Self::MissingStartupHeader { line }
            | Self::UnclosedHeader { line, .. }
            | Self::EmptyName { line } => *line,
        }
    }
}

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("`{0}` not found")]
    NotFound(String),
    #[error("invalid name `{0}`")]
    InvalidName(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error surfaced by session-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session content: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid session JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] CollaboratorError),
}
