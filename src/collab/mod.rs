//! Contracts for the backend services the session talks to.
//!
//! The session core never performs I/O itself. Content fetches, session
//! persistence and code execution go through these traits, and their
//! failures come back as [`CollaboratorError`]s without touching the
//! in-memory session.

mod fs;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use fs::{DirContentSource, DirSessionStore};

use crate::error::CollaboratorError;

/// Supplies full text for a file, tutorial or example by name.
pub trait ContentSource {
    /// # Errors
    /// Returns an error if the content cannot be produced.
    fn fetch(&self, name: &str) -> Result<String, CollaboratorError>;
}

/// Persists exported session text under a session name.
pub trait SessionStore {
    /// # Errors
    /// Returns an error if the session was not stored.
    fn save(&mut self, session_name: &str, content: &str) -> Result<(), CollaboratorError>;

    /// # Errors
    /// Returns an error if the session does not exist or cannot be read.
    fn load(&self, session_name: &str) -> Result<String, CollaboratorError>;

    /// # Errors
    /// Returns an error if the listing cannot be produced.
    fn list(&self) -> Result<Vec<String>, CollaboratorError>;
}

/// Runs code on the backend runtime.
pub trait CodeRunner {
    /// # Errors
    /// Returns an error if the code could not be submitted at all.
    fn execute(&mut self, code: &str) -> Result<ExecutionResult, CollaboratorError>;
}

/// Outcome of a code execution, forwarded as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ExecutionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
        }
    }
}

/// Session store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: BTreeMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&mut self, session_name: &str, content: &str) -> Result<(), CollaboratorError> {
        let name = session_name.trim();
        if name.is_empty() {
            return Err(CollaboratorError::InvalidName(session_name.to_string()));
        }
        self.sessions.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn load(&self, session_name: &str) -> Result<String, CollaboratorError> {
        self.sessions
            .get(session_name.trim())
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(session_name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>, CollaboratorError> {
        Ok(self.sessions.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemorySessionStore::new();
        store.save("jam", "content").unwrap();
        assert_eq!(store.load("jam").unwrap(), "content");
        assert_eq!(store.list().unwrap(), vec!["jam".to_string()]);
    }

    #[test]
    fn test_memory_store_rejects_blank_name() {
        let mut store = MemorySessionStore::new();
        assert!(matches!(
            store.save("  ", "x"),
            Err(CollaboratorError::InvalidName(_))
        ));
    }

    #[test]
    fn test_memory_store_missing_session() {
        let store = MemorySessionStore::new();
        assert!(matches!(store.load("nope"), Err(CollaboratorError::NotFound(_))));
    }

    #[test]
    fn test_execution_result_json_omits_missing_output() {
        let json = serde_json::to_string(&ExecutionResult::failed("boom")).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"boom"}"#);
    }
}
