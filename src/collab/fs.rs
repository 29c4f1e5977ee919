//! Filesystem-backed collaborators.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::{ContentSource, SessionStore};
use crate::error::CollaboratorError;

/// Stores each session as one file in a directory.
#[derive(Debug, Clone)]
pub struct DirSessionStore {
    root: PathBuf,
}

impl DirSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn session_path(&self, session_name: &str) -> Result<PathBuf, CollaboratorError> {
        let name = session_name.trim();
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && !name.contains(['/', '\\'])
            && name != "..";
        if !valid {
            return Err(CollaboratorError::InvalidName(session_name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

impl SessionStore for DirSessionStore {
    fn save(&mut self, session_name: &str, content: &str) -> Result<(), CollaboratorError> {
        let path = self.session_path(session_name)?;
        fs::create_dir_all(&self.root)?;
        fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote session file");
        Ok(())
    }

    fn load(&self, session_name: &str) -> Result<String, CollaboratorError> {
        let path = self.session_path(session_name)?;
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CollaboratorError::NotFound(session_name.to_string()),
            _ => err.into(),
        })
    }

    fn list(&self) -> Result<Vec<String>, CollaboratorError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Reads content from files below a root directory.
#[derive(Debug, Clone)]
pub struct DirContentSource {
    root: PathBuf,
}

impl DirContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentSource for DirContentSource {
    fn fetch(&self, name: &str) -> Result<String, CollaboratorError> {
        let relative = Path::new(name);
        let inside_root = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside_root {
            return Err(CollaboratorError::InvalidName(name.to_string()));
        }
        fs::read_to_string(self.root.join(relative)).map_err(|err| match err.kind() {
            ErrorKind::NotFound => CollaboratorError::NotFound(name.to_string()),
            _ => err.into(),
        })
    }
}
