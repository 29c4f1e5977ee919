use std::collections::VecDeque;
use std::fmt;
use std::time::SystemTime;

use ropey::Rope;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Default number of undo snapshots kept per buffer.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Stable identifier of a buffer inside one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferId(pub u64);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the content of a buffer came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferSource {
    #[default]
    Manual,
    Tutorial,
    MusicExample,
    Session,
    File,
}

/// Descriptive data about a buffer, independent of its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferMetadata {
    pub id: BufferId,
    pub name: String,
    pub language: String,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub is_startup_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub source: BufferSource,
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
}

impl BufferMetadata {
    /// Metadata for a plain, writable python buffer created now.
    pub fn new(id: BufferId, name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            name: name.into(),
            language: "python".to_string(),
            readonly: false,
            is_startup_file: false,
            file_path: None,
            source: BufferSource::Manual,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub const fn with_source(mut self, source: BufferSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_file_path(mut self, file_path: Option<String>) -> Self {
        self.file_path = file_path;
        self
    }

    pub const fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Flag this buffer as the session's startup file.
    pub const fn startup(mut self) -> Self {
        self.is_startup_file = true;
        self
    }
}

/// Partial metadata update. `None` fields are left untouched.
///
/// The id and the startup flag are owned by the tab manager and cannot be
/// patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub name: Option<String>,
    pub language: Option<String>,
    pub readonly: Option<bool>,
    pub file_path: Option<String>,
    pub source: Option<BufferSource>,
}

/// Serialized form of a buffer: content and metadata, no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferRecord {
    pub content: String,
    pub metadata: BufferMetadata,
}

/// Bounded linear history of full-content snapshots.
///
/// Rope clones share structure, so a snapshot per edit stays cheap.
#[derive(Clone)]
struct History {
    entries: VecDeque<Rope>,
    index: usize,
    limit: usize,
}

impl History {
    fn new(initial: Rope, limit: usize) -> Self {
        let mut entries = VecDeque::with_capacity(limit.min(8));
        entries.push_back(initial);
        Self {
            entries,
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Drop any redo tail, append, evict the oldest past the limit.
    fn push(&mut self, snapshot: Rope) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<&Rope> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    fn forward(&mut self) -> Option<&Rope> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
            self.index = self.index.saturating_sub(1);
        }
    }
}

/// One unit of editable text with metadata and undo history.
///
/// A buffer knows nothing about tabs; several tabs may display the same
/// buffer.
#[derive(Clone)]
pub struct TextBuffer {
    rope: Rope,
    metadata: BufferMetadata,
    dirty: bool,
    version: u64,
    history: History,
}

impl TextBuffer {
    /// Create a clean buffer holding `content`.
    pub fn new(metadata: BufferMetadata, content: &str) -> Self {
        let rope = Rope::from_str(content);
        Self {
            history: History::new(rope.clone(), DEFAULT_HISTORY_LIMIT),
            rope,
            metadata,
            dirty: false,
            version: 0,
        }
    }

    /// Change how many undo snapshots are kept.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history.set_limit(limit);
        self
    }

    pub const fn id(&self) -> BufferId {
        self.metadata.id
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub const fn metadata(&self) -> &BufferMetadata {
        &self.metadata
    }

    pub const fn is_startup_file(&self) -> bool {
        self.metadata.is_startup_file
    }

    /// Whether the buffer has been modified since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Monotonic counter bumped by every content change.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The full text content of the buffer.
    pub fn content(&self) -> String {
        self.rope.to_string()
    }

    /// Content length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Replace the content.
    ///
    /// Returns `false` without touching anything if the buffer is readonly
    /// or `content` equals the current text.
    pub fn set_content(&mut self, content: &str) -> bool {
        if self.metadata.readonly {
            tracing::warn!(buffer = %self.metadata.name, "buffer is readonly");
            return false;
        }
        if self.rope == content {
            return false;
        }
        self.rope = Rope::from_str(content);
        self.dirty = true;
        self.version += 1;
        self.metadata.modified_at = SystemTime::now();
        self.history.push(self.rope.clone());
        true
    }

    /// Step back one history entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.back().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Step forward one history entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.forward().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub const fn can_undo(&self) -> bool {
        self.history.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.index + 1 < self.history.entries.len()
    }

    /// Mark the buffer as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Exact comparison used to detect already-open content.
    pub fn matches_content(&self, name: &str, content: &str) -> bool {
        self.metadata.name == name && self.rope == content
    }

    /// Returns `false` and keeps the old name if `name` is blank.
    pub fn rename(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() {
            tracing::warn!(buffer = %self.metadata.name, "refusing blank buffer name");
            return false;
        }
        self.update_metadata(MetadataPatch {
            name: Some(name),
            ..MetadataPatch::default()
        });
        true
    }

    /// Apply `patch`. A blank name in the patch is ignored.
    pub fn update_metadata(&mut self, patch: MetadataPatch) {
        let MetadataPatch {
            name,
            language,
            readonly,
            file_path,
            source,
        } = patch;
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.metadata.name = name;
        }
        if let Some(language) = language {
            self.metadata.language = language;
        }
        if let Some(readonly) = readonly {
            self.metadata.readonly = readonly;
        }
        if file_path.is_some() {
            self.metadata.file_path = file_path;
        }
        if let Some(source) = source {
            self.metadata.source = source;
        }
        self.metadata.modified_at = SystemTime::now();
    }

    pub(crate) const fn set_startup_flag(&mut self, is_startup: bool) {
        self.metadata.is_startup_file = is_startup;
    }

    pub fn to_record(&self) -> BufferRecord {
        BufferRecord {
            content: self.content(),
            metadata: self.metadata.clone(),
        }
    }

    /// Rebuild a clean buffer with a fresh undo chain.
    pub fn from_record(record: BufferRecord) -> Self {
        Self::new(record.metadata, &record.content)
    }

    /// Serialize content and metadata as JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// # Errors
    /// Returns an error if `json` is not a valid buffer record.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let record: BufferRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(record))
    }

    // --- Private helpers ---

    fn restore(&mut self, snapshot: Rope) {
        self.rope = snapshot;
        self.dirty = true;
        self.version += 1;
    }
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("id", &self.metadata.id)
            .field("name", &self.metadata.name)
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("dirty", &self.dirty)
            .field("version", &self.version)
            .field(
                "history",
                &format_args!("{}/{}", self.history.index + 1, self.history.entries.len()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(content: &str) -> TextBuffer {
        TextBuffer::new(BufferMetadata::new(BufferId(1), "a.py"), content)
    }

    // --- Construction and basic queries ---

    #[test]
    fn test_new_buffer_is_clean() {
        let buf = buffer("x = 1");
        assert!(!buf.is_dirty());
        assert_eq!(buf.version(), 0);
        assert_eq!(buf.content(), "x = 1");
    }

    #[test]
    fn test_line_queries() {
        let buf = buffer("hello\r\nworld\n");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line_at(0), Some("hello".to_string()));
        assert_eq!(buf.line_at(1), Some("world".to_string()));
        assert_eq!(buf.line_at(2), Some(String::new()));
        assert_eq!(buf.line_at(3), None);
    }

    // --- set_content ---

    #[test]
    fn test_set_content_bumps_version_and_marks_dirty() {
        let mut buf = buffer("a");
        let before = buf.metadata().modified_at;
        assert!(buf.set_content("b"));
        assert_eq!(buf.content(), "b");
        assert_eq!(buf.version(), 1);
        assert!(buf.is_dirty());
        assert!(buf.metadata().modified_at >= before);
    }

    #[test]
    fn test_set_same_content_twice_bumps_version_once() {
        let mut buf = buffer("a");
        assert!(buf.set_content("b"));
        assert!(!buf.set_content("b"));
        assert_eq!(buf.version(), 1);
    }

    #[test]
    fn test_set_unchanged_content_adds_no_history() {
        let mut buf = buffer("a");
        buf.set_content("a");
        assert!(!buf.can_undo());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_readonly_buffer_ignores_writes() {
        let meta = BufferMetadata::new(BufferId(3), "ro.py").with_readonly(true);
        let mut buf = TextBuffer::new(meta, "fixed");
        assert!(!buf.set_content("changed"));
        assert_eq!(buf.content(), "fixed");
        assert_eq!(buf.version(), 0);
    }

    // --- Undo / redo ---

    #[test]
    fn test_undo_at_start_fails() {
        let mut buf = buffer("a");
        assert!(!buf.undo());
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn test_undo_then_redo_restores_content() {
        let mut buf = buffer("a");
        buf.set_content("b");
        buf.set_content("c");
        assert!(buf.undo());
        assert_eq!(buf.content(), "b");
        assert!(buf.redo());
        assert_eq!(buf.content(), "c");
        assert!(!buf.redo());
    }

    #[test]
    fn test_undo_bumps_version_without_new_history() {
        let mut buf = buffer("a");
        buf.set_content("b");
        buf.undo();
        assert_eq!(buf.version(), 2);
        assert!(buf.can_redo());
        assert!(!buf.can_undo());
    }

    #[test]
    fn test_edit_after_undo_discards_redo_tail() {
        let mut buf = buffer("a");
        buf.set_content("b");
        buf.set_content("c");
        buf.undo();
        buf.set_content("d");
        assert!(!buf.redo());
        buf.undo();
        assert_eq!(buf.content(), "b");
    }

    #[test]
    fn test_history_evicts_oldest_entries() {
        let mut buf = buffer("0").with_history_limit(3);
        for i in 1..=5 {
            buf.set_content(&i.to_string());
        }
        assert!(buf.undo());
        assert!(buf.undo());
        assert!(!buf.undo());
        assert_eq!(buf.content(), "3");
    }

    #[test]
    fn test_default_history_limit_is_fifty() {
        let mut buf = buffer("start");
        for i in 0..60 {
            buf.set_content(&format!("edit {i}"));
        }
        let mut steps = 0;
        while buf.undo() {
            steps += 1;
        }
        assert_eq!(steps, DEFAULT_HISTORY_LIMIT - 1);
        assert_eq!(buf.content(), "edit 10");
    }

    // --- Dirty tracking ---

    #[test]
    fn test_mark_clean_keeps_content() {
        let mut buf = buffer("a");
        buf.set_content("b");
        buf.mark_clean();
        assert!(!buf.is_dirty());
        assert_eq!(buf.content(), "b");
    }

    // --- Metadata ---

    #[test]
    fn test_matches_content_requires_name_and_content() {
        let buf = buffer("x=1");
        assert!(buf.matches_content("a.py", "x=1"));
        assert!(!buf.matches_content("b.py", "x=1"));
        assert!(!buf.matches_content("a.py", "x=2"));
    }

    #[test]
    fn test_rename_updates_name_only() {
        let mut buf = buffer("x=1");
        assert!(buf.rename("new.py"));
        assert_eq!(buf.name(), "new.py");
        assert_eq!(buf.content(), "x=1");
        assert_eq!(buf.version(), 0);
    }

    #[test]
    fn test_blank_names_are_refused() {
        let mut buf = buffer("");
        assert!(!buf.rename("   "));
        buf.update_metadata(MetadataPatch {
            name: Some(String::new()),
            readonly: Some(true),
            ..MetadataPatch::default()
        });
        assert_eq!(buf.name(), "a.py");
        assert!(buf.metadata().readonly);
    }

    #[test]
    fn test_update_metadata_applies_patch() {
        let mut buf = buffer("");
        buf.update_metadata(MetadataPatch {
            language: Some("supercollider".to_string()),
            source: Some(BufferSource::Tutorial),
            ..MetadataPatch::default()
        });
        assert_eq!(buf.metadata().language, "supercollider");
        assert_eq!(buf.metadata().source, BufferSource::Tutorial);
        assert_eq!(buf.name(), "a.py");
    }

    // --- Serialization ---

    #[test]
    fn test_json_roundtrip_drops_history() {
        let mut buf = buffer("a");
        buf.set_content("b");
        let json = buf.to_json().unwrap();
        let restored = TextBuffer::from_json(&json).unwrap();
        assert_eq!(restored.content(), "b");
        assert_eq!(restored.metadata(), buf.metadata());
        assert!(!restored.can_undo());
        assert!(!restored.is_dirty());
    }

    #[test]
    fn test_json_uses_camel_case_fields() {
        let meta = BufferMetadata::new(BufferId(4), "ex.py")
            .with_source(BufferSource::MusicExample)
            .startup();
        let json = TextBuffer::new(meta, "").to_json().unwrap();
        assert!(json.contains("\"isStartupFile\":true"));
        assert!(json.contains("\"source\":\"music-example\""));
    }
}
