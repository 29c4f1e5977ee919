// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. layout::LayoutManager)
    clippy::module_name_repetitions
)]

//! # Codedeck
//!
//! The session model behind a live-coding editor.
//!
//! Codedeck keeps the state a code editor front-end needs in memory:
//! - Text buffers with undo history and dirty tracking
//! - Editor tabs over those buffers, with a pinned startup file
//! - A pane layout whose tabs host UI components
//! - A plain-text session format for saving every buffer at once
//!
//! ## Architecture
//!
//! Managers are plain values owned by the host. Every mutation goes through
//! a manager method (or an [`editor::Action`] passed to
//! [`editor::TabManager::dispatch`]) and subscribers receive an immutable
//! snapshot afterwards. I/O happens only through the [`collab`] traits.
//!
//! ## Modules
//!
//! - [`editor`]: Buffers, tabs and the tab manager
//! - [`layout`]: Panes and the layout manager
//! - [`session`]: Session text writer and parser
//! - [`collab`]: Content, session storage and code runner contracts
//! - [`config`]: Settings from rc files
//! - [`store`]: Subscriber lists
//! - [`logging`]: Tracing setup

pub mod collab;
pub mod config;
pub mod editor;
pub mod error;
pub mod layout;
pub mod logging;
pub mod session;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::collab::{CodeRunner, ContentSource, ExecutionResult, SessionStore};
    pub use crate::config::{ConfigFlags, EditorSettings};
    pub use crate::editor::{
        Action, BufferId, BufferSource, CreateTabOptions, Outcome, TabId, TabManager, TextBuffer,
    };
    pub use crate::error::{CollaboratorError, ParseError, SessionError};
    pub use crate::layout::{LayoutManager, PanePosition};
}
