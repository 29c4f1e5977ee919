//! Tab manager operations that go through collaborators.
//!
//! Each call finishes its external work before touching the session, so a
//! failed fetch, save or load leaves the manager exactly as it was.

use super::buffer::BufferSource;
use super::manager::{LoadReport, TabManager};
use super::tab::TabId;
use crate::collab::{CodeRunner, ContentSource, ExecutionResult, SessionStore};
use crate::error::SessionError;

impl TabManager {
    /// Fetch `name` and open it, reusing an identical open buffer.
    ///
    /// # Errors
    /// Returns the collaborator error; the session is unchanged.
    pub fn open_from_source(
        &mut self,
        source: &impl ContentSource,
        name: &str,
        kind: BufferSource,
    ) -> Result<TabId, SessionError> {
        let content = source.fetch(name).map_err(|err| {
            tracing::error!(content_name = name, %err, "failed to fetch content");
            err
        })?;
        Ok(self.load_content(name, &content, kind))
    }

    /// Export the session and hand it to `store`; buffers are marked clean
    /// only once the store accepted it.
    ///
    /// # Errors
    /// Returns the collaborator error; dirty flags are left untouched.
    pub fn save_session(
        &mut self,
        store: &mut impl SessionStore,
        session_name: &str,
    ) -> Result<(), SessionError> {
        let content = self.export_session_content();
        if let Err(err) = store.save(session_name, &content) {
            tracing::error!(session_name, %err, "failed to save session");
            return Err(err.into());
        }
        self.mark_all_clean();
        tracing::info!(session_name, buffers = self.buffer_count(), "saved session");
        Ok(())
    }

    /// Load a stored session, best effort.
    ///
    /// # Errors
    /// Returns the collaborator error; the session is unchanged.
    pub fn load_session(
        &mut self,
        store: &impl SessionStore,
        session_name: &str,
    ) -> Result<LoadReport, SessionError> {
        let content = store.load(session_name).map_err(|err| {
            tracing::error!(session_name, %err, "failed to load session");
            err
        })?;
        Ok(self.load_session_from_content(&content))
    }

    /// Run the active buffer.
    pub fn execute_active(&self, runner: &mut impl CodeRunner) -> ExecutionResult {
        self.execute(runner, &self.active_buffer_content())
    }

    /// Run `code`; a runner that cannot be reached yields an unsuccessful
    /// result instead of an error.
    pub fn execute(&self, runner: &mut impl CodeRunner, code: &str) -> ExecutionResult {
        match runner.execute(code) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(%err, "code execution failed");
                ExecutionResult::failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemorySessionStore;
    use crate::editor::CreateTabOptions;
    use crate::error::CollaboratorError;

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn save(&mut self, _: &str, _: &str) -> Result<(), CollaboratorError> {
            Err(CollaboratorError::Rejected("server down".to_string()))
        }

        fn load(&self, name: &str) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::NotFound(name.to_string()))
        }

        fn list(&self) -> Result<Vec<String>, CollaboratorError> {
            Ok(Vec::new())
        }
    }

    struct Examples;

    impl ContentSource for Examples {
        fn fetch(&self, name: &str) -> Result<String, CollaboratorError> {
            match name {
                "bass.py" => Ok("b1 >> bass([0, 2])".to_string()),
                _ => Err(CollaboratorError::NotFound(name.to_string())),
            }
        }
    }

    struct Recorder(Vec<String>);

    impl CodeRunner for Recorder {
        fn execute(&mut self, code: &str) -> Result<ExecutionResult, CollaboratorError> {
            self.0.push(code.to_string());
            Ok(ExecutionResult {
                success: true,
                message: "ok".to_string(),
                output: Some(">> done".to_string()),
            })
        }
    }

    struct Offline;

    impl CodeRunner for Offline {
        fn execute(&mut self, _: &str) -> Result<ExecutionResult, CollaboratorError> {
            Err(CollaboratorError::Rejected("not connected".to_string()))
        }
    }

    #[test]
    fn test_save_marks_buffers_clean() {
        let mut m = TabManager::new();
        let tab = m.create_tab(CreateTabOptions::titled("a.py"));
        let buffer_id = m.tab(tab).unwrap().buffer_id;
        m.with_buffer_mut(buffer_id, |b| b.set_content("x=1"));
        let mut store = MemorySessionStore::new();
        m.save_session(&mut store, "jam").unwrap();
        assert!(m.buffers().all(|b| !b.is_dirty()));
        assert_eq!(store.load("jam").unwrap(), m.export_session_content());
    }

    #[test]
    fn test_failed_save_keeps_dirty_flags() {
        let mut m = TabManager::new();
        let tab = m.create_tab(CreateTabOptions::titled("a.py"));
        let buffer_id = m.tab(tab).unwrap().buffer_id;
        m.with_buffer_mut(buffer_id, |b| b.set_content("x=1"));
        let err = m.save_session(&mut FailingStore, "jam").unwrap_err();
        assert!(matches!(err, SessionError::Collaborator(CollaboratorError::Rejected(_))));
        assert!(m.buffer(buffer_id).unwrap().is_dirty());
    }

    #[test]
    fn test_failed_load_leaves_session() {
        let mut m = TabManager::new();
        m.create_tab(CreateTabOptions::titled("a.py"));
        assert!(m.load_session(&FailingStore, "jam").is_err());
        assert_eq!(m.tab_count(), 2);
    }

    #[test]
    fn test_open_from_source() {
        let mut m = TabManager::new();
        let tab = m
            .open_from_source(&Examples, "bass.py", BufferSource::MusicExample)
            .unwrap();
        assert_eq!(m.active_tab_id(), Some(tab));
        assert_eq!(m.active_buffer_content(), "b1 >> bass([0, 2])");
        let again = m
            .open_from_source(&Examples, "bass.py", BufferSource::MusicExample)
            .unwrap();
        assert_eq!(again, tab);
        assert!(m.open_from_source(&Examples, "nope.py", BufferSource::File).is_err());
        assert_eq!(m.buffer_count(), 2);
    }

    #[test]
    fn test_execute_active_forwards_result() {
        let m = TabManager::new();
        let mut runner = Recorder(Vec::new());
        let result = m.execute_active(&mut runner);
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some(">> done"));
        assert_eq!(runner.0, vec![m.active_buffer_content()]);
    }

    #[test]
    fn test_execute_failure_becomes_result() {
        let m = TabManager::new();
        let result = m.execute(&mut Offline, "print(1)");
        assert!(!result.success);
        assert_eq!(result.message, "rejected: not connected");
    }
}
