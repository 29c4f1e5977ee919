use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::buffer::{BufferId, BufferMetadata, BufferRecord, BufferSource, TextBuffer};
use super::tab::{EditorTab, TabId};
use crate::config::EditorSettings;
use crate::error::{ParseError, SessionError};
use crate::session::{ParsedSession, parse_session, write_session};
use crate::store::{Observers, SubscriptionId};

const STARTUP_ID: u64 = 1;

/// Options for [`TabManager::create_tab`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTabOptions {
    /// Buffer name and tab title; blank means `Untitled-<buffer id>`.
    pub title: Option<String>,
    pub content: String,
    pub source: BufferSource,
    /// Defaults to the configured language.
    pub language: Option<String>,
    pub file_path: Option<String>,
}

impl CreateTabOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub const fn with_source(mut self, source: BufferSource) -> Self {
        self.source = source;
        self
    }
}

/// Buffer fields subscribers usually need, without the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSummary {
    pub id: BufferId,
    pub name: String,
    pub dirty: bool,
    pub version: u64,
    pub is_startup_file: bool,
}

/// Immutable view of a manager handed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Tabs sorted by display order.
    pub tabs: Vec<EditorTab>,
    pub buffers: Vec<BufferSummary>,
    pub active_tab_id: Option<TabId>,
    pub active_buffer_id: Option<BufferId>,
    pub startup_buffer_id: Option<BufferId>,
    pub is_tab_switching: bool,
}

/// What a session import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub startup_replaced: bool,
    pub buffers_loaded: usize,
    /// Segments that were skipped.
    pub issues: Vec<ParseError>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagerRecord {
    buffers: Vec<BufferRecord>,
    tabs: Vec<EditorTab>,
    active_tab_id: Option<TabId>,
    next_buffer_id: u64,
    next_tab_id: u64,
}

/// Buffers and tabs of one editor view.
///
/// Exactly one buffer is the startup buffer once the manager exists; its
/// tabs cannot be closed. Every completed mutation notifies subscribers
/// with a [`SessionSnapshot`].
#[derive(Debug)]
pub struct TabManager {
    buffers: BTreeMap<BufferId, TextBuffer>,
    tabs: BTreeMap<TabId, EditorTab>,
    active_tab_id: Option<TabId>,
    next_buffer_id: u64,
    next_tab_id: u64,
    switching_until: Option<Instant>,
    settings: EditorSettings,
    observers: Observers<SessionSnapshot>,
}

impl TabManager {
    /// A manager with default settings and a fresh startup buffer.
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default())
    }

    pub fn with_settings(settings: EditorSettings) -> Self {
        let mut manager = Self::empty(settings);
        manager.ensure_startup_buffer();
        manager
    }

    fn empty(settings: EditorSettings) -> Self {
        Self {
            buffers: BTreeMap::new(),
            tabs: BTreeMap::new(),
            active_tab_id: None,
            next_buffer_id: 1,
            next_tab_id: 1,
            switching_until: None,
            settings,
            observers: Observers::new(),
        }
    }

    pub const fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    // --- Subscriptions ---

    /// Register `callback`; it immediately receives the current snapshot.
    pub fn subscribe(&mut self, callback: impl FnMut(&SessionSnapshot) + 'static) -> SubscriptionId {
        let id = self.observers.subscribe(callback);
        let snapshot = self.snapshot();
        self.observers.emit_to(id, &snapshot);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tabs: self.ordered_tabs().into_iter().cloned().collect(),
            buffers: self
                .buffers
                .values()
                .map(|b| BufferSummary {
                    id: b.id(),
                    name: b.name().to_string(),
                    dirty: b.is_dirty(),
                    version: b.version(),
                    is_startup_file: b.is_startup_file(),
                })
                .collect(),
            active_tab_id: self.active_tab_id,
            active_buffer_id: self.active_tab().map(|t| t.buffer_id),
            startup_buffer_id: self.startup_buffer().map(TextBuffer::id),
            is_tab_switching: self.is_tab_switching(),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.observers.emit(&snapshot);
    }

    // --- Queries ---

    pub fn buffer(&self, id: BufferId) -> Option<&TextBuffer> {
        self.buffers.get(&id)
    }

    /// All buffers in id (creation) order.
    pub fn buffers(&self) -> impl Iterator<Item = &TextBuffer> {
        self.buffers.values()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn tab(&self, id: TabId) -> Option<&EditorTab> {
        self.tabs.get(&id)
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Tabs sorted by display order, ties broken by id.
    pub fn ordered_tabs(&self) -> Vec<&EditorTab> {
        let mut tabs: Vec<_> = self.tabs.values().collect();
        tabs.sort_by_key(|t| (t.order, t.id));
        tabs
    }

    /// Ids of every tab showing `buffer_id`, lowest first.
    pub fn tabs_for_buffer(&self, buffer_id: BufferId) -> Vec<TabId> {
        self.tabs
            .values()
            .filter(|t| t.buffer_id == buffer_id)
            .map(|t| t.id)
            .collect()
    }

    pub const fn active_tab_id(&self) -> Option<TabId> {
        self.active_tab_id
    }

    pub fn active_tab(&self) -> Option<&EditorTab> {
        self.active_tab_id.and_then(|id| self.tabs.get(&id))
    }

    pub fn active_buffer(&self) -> Option<&TextBuffer> {
        self.active_tab().and_then(|t| self.buffers.get(&t.buffer_id))
    }

    /// Content of the active buffer, empty when no tab is active.
    pub fn active_buffer_content(&self) -> String {
        self.active_buffer().map(TextBuffer::content).unwrap_or_default()
    }

    pub fn startup_buffer(&self) -> Option<&TextBuffer> {
        self.buffers.values().find(|b| b.is_startup_file())
    }

    /// The pinned tab of the startup buffer, else its lowest-id tab.
    pub fn startup_tab(&self) -> Option<&EditorTab> {
        let startup = self.startup_buffer()?.id();
        let tabs: Vec<&EditorTab> = self
            .tabs
            .values()
            .filter(|t| t.buffer_id == startup)
            .collect();
        tabs.iter()
            .find(|t| t.is_pinned)
            .or_else(|| tabs.first())
            .copied()
    }

    /// Whether a tab switch happened within the debounce window.
    ///
    /// Content-sync code should ignore editor change events while this is
    /// set; they come from the editor widget swapping documents.
    pub fn is_tab_switching(&self) -> bool {
        self.switching_until
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    fn is_startup_buffer(&self, id: BufferId) -> bool {
        self.buffers.get(&id).is_some_and(TextBuffer::is_startup_file)
    }

    // --- Startup buffer ---

    /// Create the startup buffer and its pinned tab if missing.
    ///
    /// Returns `true` if anything was created. Ids 1 are used when free.
    pub fn ensure_startup_buffer(&mut self) -> bool {
        if self.startup_buffer().is_some() {
            return false;
        }
        let buffer_id = if self.buffers.contains_key(&BufferId(STARTUP_ID)) {
            self.alloc_buffer_id()
        } else {
            BufferId(STARTUP_ID)
        };
        let tab_id = if self.tabs.contains_key(&TabId(STARTUP_ID)) {
            self.alloc_tab_id()
        } else {
            TabId(STARTUP_ID)
        };
        let name = self.settings.startup_name.clone();
        let meta = BufferMetadata::new(buffer_id, name.clone())
            .with_language(self.settings.default_language.clone())
            .startup();
        let buffer = self.new_buffer(meta, &self.settings.startup_content);
        self.buffers.insert(buffer_id, buffer);
        self.tabs
            .insert(tab_id, EditorTab::new(tab_id, buffer_id, name, 0).pinned());
        self.next_buffer_id = self.next_buffer_id.max(STARTUP_ID + 1);
        self.next_tab_id = self.next_tab_id.max(STARTUP_ID + 1);
        self.set_active(Some(tab_id));
        tracing::debug!(%buffer_id, %tab_id, "created startup buffer");
        self.notify();
        true
    }

    // --- Tabs ---

    /// Open a new buffer in a new, active tab.
    pub fn create_tab(&mut self, options: CreateTabOptions) -> TabId {
        let tab_id = self.insert_tab(options);
        self.notify();
        tab_id
    }

    /// Open `content`, or switch to the tab already showing the exact same
    /// name and content.
    pub fn load_content(&mut self, name: &str, content: &str, source: BufferSource) -> TabId {
        let existing = self
            .buffers
            .values()
            .filter(|b| b.matches_content(name, content))
            .find_map(|b| self.tabs_for_buffer(b.id()).first().copied());
        if let Some(tab_id) = existing {
            tracing::debug!(buffer_name = name, %tab_id, "content already open");
            self.switch_to_tab(tab_id);
            return tab_id;
        }
        self.create_tab(CreateTabOptions {
            title: Some(name.to_string()),
            content: content.to_string(),
            source,
            ..CreateTabOptions::default()
        })
    }

    /// Make `tab_id` active. Returns `false` for unknown tabs.
    pub fn switch_to_tab(&mut self, tab_id: TabId) -> bool {
        self.switch_to_tab_then(tab_id, || {})
    }

    /// Make `tab_id` active, then run `on_switched`.
    ///
    /// The callback also runs when the tab was already active. A real
    /// switch opens the `is_tab_switching` window; switching again before it
    /// closes restarts it.
    pub fn switch_to_tab_then(&mut self, tab_id: TabId, on_switched: impl FnOnce()) -> bool {
        if !self.tabs.contains_key(&tab_id) {
            tracing::error!(%tab_id, "tab not found");
            return false;
        }
        if self.active_tab_id == Some(tab_id) {
            on_switched();
            return true;
        }
        self.set_active(Some(tab_id));
        self.switching_until = Some(Instant::now() + self.settings.switch_debounce);
        self.notify();
        on_switched();
        true
    }

    /// Close a tab, dropping its buffer if no other tab shows it.
    ///
    /// Tabs of the startup buffer cannot be closed.
    pub fn close_tab(&mut self, tab_id: TabId) -> bool {
        let Some(buffer_id) = self.tabs.get(&tab_id).map(|t| t.buffer_id) else {
            tracing::error!(%tab_id, "tab not found");
            return false;
        };
        if self.is_startup_buffer(buffer_id) {
            tracing::warn!(%tab_id, "cannot close startup tab");
            return false;
        }

        self.tabs.remove(&tab_id);
        let still_used = self.tabs.values().any(|t| t.buffer_id == buffer_id);
        if !still_used {
            self.buffers.remove(&buffer_id);
        }

        if self.active_tab_id == Some(tab_id) {
            let next = self
                .startup_tab()
                .map(|t| t.id)
                .or_else(|| self.tabs.keys().next().copied());
            self.active_tab_id = None;
            self.set_active(next);
        }
        tracing::debug!(%tab_id, %buffer_id, buffer_dropped = !still_used, "closed tab");
        self.notify();
        true
    }

    /// Open a second tab on the buffer shown by `tab_id`.
    pub fn split_tab(&mut self, tab_id: TabId) -> Option<TabId> {
        let Some(source) = self.tabs.get(&tab_id) else {
            tracing::error!(%tab_id, "tab not found");
            return None;
        };
        let (buffer_id, title) = (source.buffer_id, source.title.clone());
        let new_id = self.alloc_tab_id();
        let order = self.next_order();
        self.tabs
            .insert(new_id, EditorTab::new(new_id, buffer_id, title, order));
        self.set_active(Some(new_id));
        self.notify();
        Some(new_id)
    }

    /// Assign display order from the position of each id in `tab_ids`.
    ///
    /// Unknown ids are ignored; unlisted tabs keep their order. Returns
    /// `false` when no id matched.
    pub fn reorder_tabs(&mut self, tab_ids: &[TabId]) -> bool {
        let mut matched = false;
        for (order, id) in (0u64..).zip(tab_ids) {
            if let Some(tab) = self.tabs.get_mut(id) {
                tab.set_order(order);
                matched = true;
            }
        }
        if matched {
            self.notify();
        }
        matched
    }

    /// Pin or unpin a tab. The startup buffer's tabs keep their pin state.
    pub fn set_pinned(&mut self, tab_id: TabId, pinned: bool) -> bool {
        let Some(buffer_id) = self.tabs.get(&tab_id).map(|t| t.buffer_id) else {
            tracing::error!(%tab_id, "tab not found");
            return false;
        };
        if self.is_startup_buffer(buffer_id) {
            tracing::warn!(%tab_id, "startup tab pin state is fixed");
            return false;
        }
        if let Some(tab) = self.tabs.get_mut(&tab_id) {
            tab.set_pinned(pinned);
        }
        self.notify();
        true
    }

    pub fn toggle_pin(&mut self, tab_id: TabId) -> bool {
        let Some(pinned) = self.tabs.get(&tab_id).map(|t| t.is_pinned) else {
            tracing::error!(%tab_id, "tab not found");
            return false;
        };
        self.set_pinned(tab_id, !pinned)
    }

    // --- Title editing ---

    pub fn start_editing_tab_name(&mut self, tab_id: TabId) -> bool {
        self.edit_tab(tab_id, EditorTab::start_editing)
    }

    pub fn stop_editing_tab_name(&mut self, tab_id: TabId) -> bool {
        self.edit_tab(tab_id, EditorTab::stop_editing)
    }

    /// Leave title editing, renaming the tab's buffer to `name` when it is
    /// not blank.
    pub fn finish_editing_tab_name(&mut self, tab_id: TabId, name: &str) -> bool {
        let Some(buffer_id) = self.tabs.get(&tab_id).map(|t| t.buffer_id) else {
            tracing::error!(%tab_id, "tab not found");
            return false;
        };
        let name = name.trim();
        if !name.is_empty() {
            self.rename_buffer(buffer_id, name);
        }
        self.stop_editing_tab_name(tab_id)
    }

    fn edit_tab(&mut self, tab_id: TabId, f: impl FnOnce(&mut EditorTab)) -> bool {
        let Some(tab) = self.tabs.get_mut(&tab_id) else {
            tracing::error!(%tab_id, "tab not found");
            return false;
        };
        f(tab);
        self.notify();
        true
    }

    // --- Buffers ---

    /// Rename a buffer and retitle every tab showing it.
    pub fn rename_buffer(&mut self, buffer_id: BufferId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!(%buffer_id, "refusing blank buffer name");
            return false;
        }
        let Some(buffer) = self.buffers.get_mut(&buffer_id) else {
            tracing::error!(%buffer_id, "buffer not found");
            return false;
        };
        if !buffer.rename(name) {
            return false;
        }
        for tab in self.tabs.values_mut().filter(|t| t.buffer_id == buffer_id) {
            tab.set_title(name);
        }
        tracing::info!(%buffer_id, buffer_name = name, "renamed buffer");
        self.notify();
        true
    }

    /// Write to the active buffer.
    ///
    /// Skipped while a tab switch is settling, since the change most likely
    /// echoes the previous tab's content.
    pub fn update_active_buffer_content(&mut self, content: &str) -> bool {
        if self.is_tab_switching() {
            tracing::debug!("skipping content update during tab switch");
            return false;
        }
        let Some(buffer_id) = self.active_tab().map(|t| t.buffer_id) else {
            return false;
        };
        self.edit_buffer(buffer_id, |b| b.set_content(content))
    }

    pub fn undo_active(&mut self) -> bool {
        let Some(buffer_id) = self.active_tab().map(|t| t.buffer_id) else {
            return false;
        };
        self.edit_buffer(buffer_id, TextBuffer::undo)
    }

    pub fn redo_active(&mut self) -> bool {
        let Some(buffer_id) = self.active_tab().map(|t| t.buffer_id) else {
            return false;
        };
        self.edit_buffer(buffer_id, TextBuffer::redo)
    }

    /// Mutate one buffer, then notify subscribers once.
    ///
    /// Names should change through [`Self::rename_buffer`], which also
    /// retitles the buffer's tabs.
    pub fn with_buffer_mut<R>(
        &mut self,
        buffer_id: BufferId,
        f: impl FnOnce(&mut TextBuffer) -> R,
    ) -> Option<R> {
        let Some(buffer) = self.buffers.get_mut(&buffer_id) else {
            tracing::error!(%buffer_id, "buffer not found");
            return None;
        };
        let result = f(buffer);
        self.notify();
        Some(result)
    }

    /// Apply an edit that reports whether it changed anything; notifies
    /// only when it did.
    fn edit_buffer(&mut self, buffer_id: BufferId, f: impl FnOnce(&mut TextBuffer) -> bool) -> bool {
        let Some(buffer) = self.buffers.get_mut(&buffer_id) else {
            tracing::error!(%buffer_id, "buffer not found");
            return false;
        };
        let changed = f(buffer);
        if changed {
            self.notify();
        }
        changed
    }

    /// Clear the dirty flag of every buffer (after a successful save).
    pub fn mark_all_clean(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.mark_clean();
        }
        self.notify();
    }

    // --- Sessions ---

    /// Render the whole session in the delimited text format.
    pub fn export_session_content(&self) -> String {
        let (startup_name, startup_content) = self.startup_buffer().map_or_else(
            || (self.settings.startup_name.clone(), String::new()),
            |b| (b.name().to_string(), b.content()),
        );
        let others: Vec<(String, String)> = self
            .buffers
            .values()
            .filter(|b| !b.is_startup_file())
            .map(|b| (b.name().to_string(), b.content()))
            .collect();
        write_session((&startup_name, &startup_content), others)
    }

    /// Replace the session with the buffers described by `content`.
    ///
    /// Best effort: malformed segments are skipped and listed in the
    /// report. Without a startup block the current startup buffer is kept
    /// as is. Tab 1 always comes back as the pinned, active startup tab.
    pub fn load_session_from_content(&mut self, content: &str) -> LoadReport {
        self.apply_session(parse_session(content))
    }

    /// Like [`Self::load_session_from_content`], but leaves the session
    /// untouched unless the whole text parses cleanly.
    ///
    /// # Errors
    /// Returns the first malformed segment.
    pub fn load_session_strict(&mut self, content: &str) -> Result<LoadReport, SessionError> {
        let parsed = parse_session(content).into_strict()?;
        Ok(self.apply_session(parsed))
    }

    fn apply_session(&mut self, parsed: ParsedSession) -> LoadReport {
        for issue in &parsed.issues {
            tracing::warn!(%issue, "skipped session segment");
        }
        self.ensure_startup_buffer();
        let startup_id = self
            .startup_buffer()
            .map_or(BufferId(STARTUP_ID), TextBuffer::id);

        self.buffers.retain(|id, _| *id == startup_id);
        self.tabs.clear();
        self.active_tab_id = None;
        self.switching_until = None;

        let startup_replaced = if let Some(section) = parsed.startup {
            let meta = BufferMetadata::new(startup_id, section.name)
                .with_language(self.settings.default_language.clone())
                .with_source(BufferSource::Session)
                .startup();
            let buffer = self.new_buffer(meta, &section.content);
            self.buffers.insert(startup_id, buffer);
            true
        } else {
            false
        };

        let startup_tab = TabId(STARTUP_ID);
        let title = self
            .buffers
            .get(&startup_id)
            .map_or_else(|| self.settings.startup_name.clone(), |b| b.name().to_string());
        self.tabs
            .insert(startup_tab, EditorTab::new(startup_tab, startup_id, title, 0).pinned());
        self.next_tab_id = self.next_tab_id.max(STARTUP_ID + 1);

        let buffers_loaded = parsed.buffers.len();
        for section in parsed.buffers {
            self.insert_tab(CreateTabOptions {
                title: Some(section.name),
                content: section.content,
                source: BufferSource::Session,
                ..CreateTabOptions::default()
            });
        }
        self.set_active(Some(startup_tab));
        tracing::info!(buffers_loaded, startup_replaced, "loaded session");
        self.notify();

        LoadReport {
            startup_replaced,
            buffers_loaded,
            issues: parsed.issues,
        }
    }

    /// Start over: keep the startup content, drop every other buffer, and
    /// open an empty `Untitled` tab.
    pub fn new_session(&mut self) -> TabId {
        self.ensure_startup_buffer();
        let startup_id = self
            .startup_buffer()
            .map_or(BufferId(STARTUP_ID), TextBuffer::id);
        let title = self
            .startup_buffer()
            .map_or_else(|| self.settings.startup_name.clone(), |b| b.name().to_string());
        self.buffers.retain(|id, _| *id == startup_id);
        self.tabs.clear();
        self.active_tab_id = None;
        let startup_tab = TabId(STARTUP_ID);
        self.tabs
            .insert(startup_tab, EditorTab::new(startup_tab, startup_id, title, 0).pinned());

        let untitled = self.insert_tab(CreateTabOptions::titled("Untitled"));
        self.set_active(Some(startup_tab));
        self.switch_to_tab(untitled);
        tracing::info!("started new session");
        untitled
    }

    // --- JSON ---

    /// Serialize buffers, tabs, active tab and id counters.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        let record = ManagerRecord {
            buffers: self.buffers.values().map(TextBuffer::to_record).collect(),
            tabs: self.tabs.values().cloned().collect(),
            active_tab_id: self.active_tab_id,
            next_buffer_id: self.next_buffer_id,
            next_tab_id: self.next_tab_id,
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }

    /// # Errors
    /// Returns an error if `json` is not a serialized manager.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        Self::from_json_with_settings(json, EditorSettings::default())
    }

    /// Restore a manager, repairing anything that would break its
    /// invariants: dangling tabs are dropped, id counters move past the
    /// highest id, only the lowest-id startup buffer keeps the flag, and
    /// that buffer ends up with exactly one pinned tab.
    ///
    /// # Errors
    /// Returns an error if `json` is not a serialized manager.
    pub fn from_json_with_settings(json: &str, settings: EditorSettings) -> Result<Self, SessionError> {
        let record: ManagerRecord = serde_json::from_str(json)?;
        let mut manager = Self::empty(settings);

        let mut seen_startup = false;
        for buffer in record.buffers {
            let mut buffer = TextBuffer::from_record(buffer)
                .with_history_limit(manager.settings.history_limit);
            if buffer.is_startup_file() {
                if seen_startup {
                    tracing::warn!(buffer_id = %buffer.id(), "dropping duplicate startup flag");
                    buffer.set_startup_flag(false);
                }
                seen_startup = true;
            }
            manager.buffers.insert(buffer.id(), buffer);
        }
        for mut tab in record.tabs {
            if !manager.buffers.contains_key(&tab.buffer_id) {
                tracing::warn!(tab_id = %tab.id, buffer_id = %tab.buffer_id, "dropping tab without buffer");
                continue;
            }
            tab.set_active(false);
            manager.tabs.insert(tab.id, tab);
        }

        let max_buffer = manager.buffers.keys().next_back().map_or(0, |id| id.0);
        let max_tab = manager.tabs.keys().next_back().map_or(0, |id| id.0);
        manager.next_buffer_id = record.next_buffer_id.max(max_buffer + 1);
        manager.next_tab_id = record.next_tab_id.max(max_tab + 1);

        manager.ensure_startup_buffer();
        manager.repair_startup_tabs();
        let active = record
            .active_tab_id
            .filter(|id| manager.tabs.contains_key(id))
            .or_else(|| manager.startup_tab().map(|t| t.id));
        manager.active_tab_id = None;
        manager.set_active(active);
        Ok(manager)
    }

    // --- Private helpers ---

    /// Give the startup buffer a tab if it has none, and leave exactly one
    /// of its tabs pinned.
    fn repair_startup_tabs(&mut self) {
        let Some((startup_id, name)) = self
            .startup_buffer()
            .map(|b| (b.id(), b.name().to_string()))
        else {
            return;
        };
        let tab_ids = self.tabs_for_buffer(startup_id);
        let Some(&first) = tab_ids.first() else {
            let tab_id = if self.tabs.contains_key(&TabId(STARTUP_ID)) {
                self.alloc_tab_id()
            } else {
                TabId(STARTUP_ID)
            };
            tracing::warn!(buffer_id = %startup_id, %tab_id, "restoring missing startup tab");
            self.tabs
                .insert(tab_id, EditorTab::new(tab_id, startup_id, name, 0).pinned());
            self.next_tab_id = self.next_tab_id.max(tab_id.0 + 1);
            return;
        };
        let keep = tab_ids
            .iter()
            .copied()
            .find(|id| self.tabs.get(id).is_some_and(|t| t.is_pinned))
            .unwrap_or(first);
        for id in tab_ids {
            if let Some(tab) = self.tabs.get_mut(&id) {
                tab.set_pinned(id == keep);
            }
        }
    }

    const fn alloc_buffer_id(&mut self) -> BufferId {
        let id = BufferId(self.next_buffer_id);
        self.next_buffer_id += 1;
        id
    }

    const fn alloc_tab_id(&mut self) -> TabId {
        let id = TabId(self.next_tab_id);
        self.next_tab_id += 1;
        id
    }

    fn next_order(&self) -> u64 {
        self.tabs.values().map(|t| t.order + 1).max().unwrap_or(0)
    }

    fn new_buffer(&self, metadata: BufferMetadata, content: &str) -> TextBuffer {
        TextBuffer::new(metadata, content).with_history_limit(self.settings.history_limit)
    }

    /// Create buffer and tab, make the tab active, without notifying.
    fn insert_tab(&mut self, options: CreateTabOptions) -> TabId {
        let CreateTabOptions {
            title,
            content,
            source,
            language,
            file_path,
        } = options;
        let buffer_id = self.alloc_buffer_id();
        let tab_id = self.alloc_tab_id();
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Untitled-{buffer_id}"));
        let meta = BufferMetadata::new(buffer_id, title.clone())
            .with_language(language.unwrap_or_else(|| self.settings.default_language.clone()))
            .with_source(source)
            .with_file_path(file_path);
        let buffer = self.new_buffer(meta, &content);
        let order = self.next_order();
        self.buffers.insert(buffer_id, buffer);
        self.tabs
            .insert(tab_id, EditorTab::new(tab_id, buffer_id, title, order));
        self.set_active(Some(tab_id));
        tracing::debug!(%buffer_id, %tab_id, ?source, "created tab");
        tab_id
    }

    /// Move the active flag; keeps at most one tab active.
    fn set_active(&mut self, tab_id: Option<TabId>) {
        if let Some(previous) = self.active_tab_id.and_then(|id| self.tabs.get_mut(&id)) {
            previous.set_active(false);
        }
        self.active_tab_id = tab_id.filter(|id| self.tabs.contains_key(id));
        if let Some(current) = self.active_tab_id.and_then(|id| self.tabs.get_mut(&id)) {
            current.set_active(true);
        }
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}
