use std::fmt;

use serde::{Deserialize, Serialize};

use super::buffer::BufferId;

/// Stable identifier of a tab inside one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A UI frame displaying one buffer.
///
/// The tab only references its buffer; closing the tab does not destroy the
/// buffer while other tabs still show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorTab {
    pub id: TabId,
    pub buffer_id: BufferId,
    pub title: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_editing: bool,
    #[serde(default)]
    pub is_pinned: bool,
    /// Sort key; not necessarily contiguous.
    pub order: u64,
}

impl EditorTab {
    pub fn new(id: TabId, buffer_id: BufferId, title: impl Into<String>, order: u64) -> Self {
        Self {
            id,
            buffer_id,
            title: title.into(),
            is_active: false,
            is_editing: false,
            is_pinned: false,
            order,
        }
    }

    pub const fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub const fn start_editing(&mut self) {
        self.is_editing = true;
    }

    pub const fn stop_editing(&mut self) {
        self.is_editing = false;
    }

    pub const fn set_order(&mut self, order: u64) {
        self.order = order;
    }

    pub(crate) const fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub(crate) const fn set_pinned(&mut self, pinned: bool) {
        self.is_pinned = pinned;
    }
}
