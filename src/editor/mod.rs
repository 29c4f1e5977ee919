//! Editor session model: text buffers and the tabs that display them.
//!
//! A [`TabManager`] owns every buffer and tab of one editor view. Buffers
//! are rope-backed with snapshot undo history; tabs only reference them, so
//! several tabs can show the same buffer. One buffer is always the startup
//! file and its tab is pinned.

mod action;
mod buffer;
mod io;
mod manager;
mod tab;

pub use action::{Action, Outcome};
pub use buffer::{
    BufferId, BufferMetadata, BufferRecord, BufferSource, DEFAULT_HISTORY_LIMIT, MetadataPatch,
    TextBuffer,
};
pub use manager::{BufferSummary, CreateTabOptions, LoadReport, SessionSnapshot, TabManager};
pub use tab::{EditorTab, TabId};
