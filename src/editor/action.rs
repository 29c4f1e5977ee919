//! UI events routed to a [`TabManager`] as plain values.

use super::buffer::{BufferId, BufferSource};
use super::manager::{CreateTabOptions, TabManager};
use super::tab::TabId;

/// Everything the tab bar and editor widget can ask of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Tabs
    /// Open an empty tab, optionally titled
    NewTab(Option<String>),
    /// Open named content, reusing an identical tab
    LoadContent {
        name: String,
        content: String,
        source: BufferSource,
    },
    SwitchTab(TabId),
    CloseTab(TabId),
    SplitTab(TabId),
    TogglePin(TabId),
    ReorderTabs(Vec<TabId>),

    // Titles
    StartEditingTitle(TabId),
    /// Commit the typed title
    FinishEditingTitle(TabId, String),
    CancelEditingTitle(TabId),
    RenameBuffer(BufferId, String),

    // Content
    /// Editor widget reported new text for the active buffer
    EditActive(String),
    Undo,
    Redo,

    // Session
    NewSession,
    /// Replace the session with exported session text
    LoadSessionText(String),
}

/// Result of [`TabManager::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A tab was opened or focused.
    Opened(TabId),
    /// The session changed.
    Applied,
    /// Refused or no-op; the session is unchanged.
    Ignored,
}

impl Outcome {
    const fn from_bool(changed: bool) -> Self {
        if changed { Self::Applied } else { Self::Ignored }
    }

    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

impl TabManager {
    /// Apply one UI action.
    pub fn dispatch(&mut self, action: Action) -> Outcome {
        tracing::trace!(?action, "dispatch");
        match action {
            Action::NewTab(title) => Outcome::Opened(self.create_tab(CreateTabOptions {
                title,
                ..CreateTabOptions::default()
            })),
            Action::LoadContent {
                name,
                content,
                source,
            } => Outcome::Opened(self.load_content(&name, &content, source)),
            Action::SwitchTab(tab_id) => {
                if self.switch_to_tab(tab_id) {
                    Outcome::Opened(tab_id)
                } else {
                    Outcome::Ignored
                }
            }
            Action::CloseTab(tab_id) => Outcome::from_bool(self.close_tab(tab_id)),
            Action::SplitTab(tab_id) => self.split_tab(tab_id).map_or(Outcome::Ignored, Outcome::Opened),
            Action::TogglePin(tab_id) => Outcome::from_bool(self.toggle_pin(tab_id)),
            Action::ReorderTabs(ids) => Outcome::from_bool(self.reorder_tabs(&ids)),
            Action::StartEditingTitle(tab_id) => {
                Outcome::from_bool(self.start_editing_tab_name(tab_id))
            }
            Action::FinishEditingTitle(tab_id, name) => {
                Outcome::from_bool(self.finish_editing_tab_name(tab_id, &name))
            }
            Action::CancelEditingTitle(tab_id) => {
                Outcome::from_bool(self.stop_editing_tab_name(tab_id))
            }
            Action::RenameBuffer(buffer_id, name) => {
                Outcome::from_bool(self.rename_buffer(buffer_id, &name))
            }
            Action::EditActive(content) => {
                Outcome::from_bool(self.update_active_buffer_content(&content))
            }
            Action::Undo => Outcome::from_bool(self.undo_active()),
            Action::Redo => Outcome::from_bool(self.redo_active()),
            Action::NewSession => Outcome::Opened(self.new_session()),
            Action::LoadSessionText(text) => {
                let report = self.load_session_from_content(&text);
                if !report.issues.is_empty() {
                    tracing::warn!(issues = report.issues.len(), "session loaded with issues");
                }
                Outcome::Applied
            }
        }
    }
}
