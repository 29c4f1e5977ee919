use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pane::{Pane, PaneDimensions, PanePosition};
use super::pane_tab::ComponentProps;
use crate::error::SessionError;
use crate::store::{Observers, SubscriptionId};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A tab created together with its pane.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTab {
    pub title: String,
    pub component_type: String,
    pub component_props: ComponentProps,
    pub is_closeable: bool,
}

impl DefaultTab {
    pub fn new(title: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            component_type: component_type.into(),
            component_props: ComponentProps::new(),
            is_closeable: true,
        }
    }

    pub const fn fixed(mut self) -> Self {
        self.is_closeable = false;
        self
    }
}

/// Options for [`LayoutManager::create_pane`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePaneOptions {
    /// Also slugged into the pane id.
    pub title: Option<String>,
    pub dimensions: PaneDimensions,
    pub is_resizable: bool,
    pub is_visible: Option<bool>,
    pub default_tabs: Vec<DefaultTab>,
}

impl Default for CreatePaneOptions {
    fn default() -> Self {
        Self {
            title: None,
            dimensions: PaneDimensions::default(),
            is_resizable: true,
            is_visible: None,
            default_tabs: Vec::new(),
        }
    }
}

impl CreatePaneOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub const fn with_dimensions(mut self, dimensions: PaneDimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_tab(mut self, tab: DefaultTab) -> Self {
        self.default_tabs.push(tab);
        self
    }
}

/// Layout-wide presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    pub theme: String,
    pub show_pane_titles: bool,
    pub enable_animations: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            show_pane_titles: true,
            enable_animations: true,
        }
    }
}

/// Partial update for [`GlobalSettings`]; `None` fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalSettingsPatch {
    pub theme: Option<String>,
    pub show_pane_titles: Option<bool>,
    pub enable_animations: Option<bool>,
}

/// Serializable layout: settings plus every pane with its tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    #[serde(default)]
    pub global_settings: Option<GlobalSettings>,
    pub panes: Vec<Pane>,
}

/// Immutable view of a layout handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSnapshot {
    pub panes: Vec<Pane>,
    pub is_resizing: bool,
    pub global_settings: GlobalSettings,
}

/// Owns every pane of the window.
#[derive(Debug)]
pub struct LayoutManager {
    /// Creation order.
    panes: Vec<Pane>,
    is_resizing: bool,
    global_settings: GlobalSettings,
    observers: Observers<LayoutSnapshot>,
}

/// Pane id for `position` and an optional title: `position` alone, or
/// `position-<title lowercased, whitespace runs as '-'>`.
pub fn pane_id_for(position: PanePosition, title: Option<&str>) -> String {
    match title.filter(|t| !t.is_empty()) {
        Some(title) => format!(
            "{}-{}",
            position,
            WHITESPACE_RUN.replace_all(&title.to_lowercase(), "-")
        ),
        None => position.to_string(),
    }
}

impl LayoutManager {
    /// A manager holding the default eight-pane layout.
    pub fn new() -> Self {
        let mut manager = Self::empty();
        manager.install_default_layout();
        manager
    }

    /// A manager without panes.
    pub fn empty() -> Self {
        Self {
            panes: Vec::new(),
            is_resizing: false,
            global_settings: GlobalSettings::default(),
            observers: Observers::new(),
        }
    }

    fn install_default_layout(&mut self) {
        for (position, title, dimensions, tab) in default_panes() {
            let mut options = CreatePaneOptions::titled(title).with_dimensions(dimensions);
            if let Some(tab) = tab {
                options = options.with_tab(tab);
            }
            self.insert_pane(position, options);
        }
    }

    // --- Subscriptions ---

    /// Register `callback`; it immediately receives the current snapshot.
    pub fn subscribe(&mut self, callback: impl FnMut(&LayoutSnapshot) + 'static) -> SubscriptionId {
        let id = self.observers.subscribe(callback);
        let snapshot = self.snapshot();
        self.observers.emit_to(id, &snapshot);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            panes: self.panes.clone(),
            is_resizing: self.is_resizing,
            global_settings: self.global_settings.clone(),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.observers.emit(&snapshot);
    }

    // --- Panes ---

    /// Create a pane, replacing any pane with the same id in place.
    pub fn create_pane(&mut self, position: PanePosition, options: CreatePaneOptions) -> String {
        let id = self.insert_pane(position, options);
        self.notify();
        id
    }

    fn insert_pane(&mut self, position: PanePosition, options: CreatePaneOptions) -> String {
        let CreatePaneOptions {
            title,
            dimensions,
            is_resizable,
            is_visible,
            default_tabs,
        } = options;
        let id = pane_id_for(position, title.as_deref());
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| position.to_string());
        let mut pane = Pane::new(id.clone(), position, title, dimensions, is_resizable);
        for tab in default_tabs {
            pane.add_tab(tab.title, tab.component_type, tab.component_props, tab.is_closeable);
        }
        if let Some(visible) = is_visible {
            pane.set_visible(visible);
        }

        if let Some(slot) = self.panes.iter_mut().find(|p| p.id() == id) {
            tracing::debug!(pane = %id, "replacing pane");
            *slot = pane;
        } else {
            tracing::debug!(pane = %id, %position, "created pane");
            self.panes.push(pane);
        }
        id
    }

    pub fn pane(&self, pane_id: &str) -> Option<&Pane> {
        self.panes.iter().find(|p| p.id() == pane_id)
    }

    /// First pane, in creation order, at `position`.
    pub fn pane_by_position(&self, position: PanePosition) -> Option<&Pane> {
        self.panes.iter().find(|p| p.position() == position)
    }

    /// Mutate one pane, then notify subscribers once.
    pub fn with_pane_mut<R>(&mut self, pane_id: &str, f: impl FnOnce(&mut Pane) -> R) -> Option<R> {
        let Some(pane) = self.panes.iter_mut().find(|p| p.id() == pane_id) else {
            tracing::error!(pane = pane_id, "pane not found");
            return None;
        };
        let result = f(pane);
        self.notify();
        Some(result)
    }

    pub fn remove_pane(&mut self, pane_id: &str) -> bool {
        let before = self.panes.len();
        self.panes.retain(|p| p.id() != pane_id);
        if self.panes.len() == before {
            return false;
        }
        tracing::debug!(pane = pane_id, "removed pane");
        self.notify();
        true
    }

    /// All panes in creation order.
    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn visible_panes(&self) -> Vec<&Pane> {
        self.panes.iter().filter(|p| p.is_visible()).collect()
    }

    // --- Tabs ---

    pub fn add_tab_to_pane(
        &mut self,
        pane_id: &str,
        title: &str,
        component_type: &str,
        props: ComponentProps,
        closeable: bool,
    ) -> Option<String> {
        self.with_pane_mut(pane_id, |pane| {
            pane.add_tab(title, component_type, props, closeable)
        })
    }

    pub fn remove_tab_from_pane(&mut self, pane_id: &str, tab_id: &str) -> bool {
        self.with_pane_mut(pane_id, |pane| pane.remove_tab(tab_id))
            .unwrap_or(false)
    }

    pub fn switch_to_tab(&mut self, pane_id: &str, tab_id: &str) -> bool {
        self.with_pane_mut(pane_id, |pane| pane.switch_to_tab(tab_id))
            .unwrap_or(false)
    }

    // --- Sizing and visibility ---

    pub const fn is_resizing(&self) -> bool {
        self.is_resizing
    }

    pub fn start_resize(&mut self) {
        self.is_resizing = true;
        self.notify();
    }

    pub fn end_resize(&mut self) {
        self.is_resizing = false;
        self.notify();
    }

    pub fn update_pane_dimensions(&mut self, pane_id: &str, patch: &PaneDimensions) -> bool {
        self.with_pane_mut(pane_id, |pane| pane.set_dimensions(patch))
            .is_some()
    }

    pub fn toggle_pane_visibility(&mut self, pane_id: &str) -> bool {
        self.with_pane_mut(pane_id, Pane::toggle_visibility).is_some()
    }

    // --- Settings ---

    pub const fn global_settings(&self) -> &GlobalSettings {
        &self.global_settings
    }

    pub fn update_global_settings(&mut self, patch: GlobalSettingsPatch) {
        let GlobalSettingsPatch {
            theme,
            show_pane_titles,
            enable_animations,
        } = patch;
        if let Some(theme) = theme {
            self.global_settings.theme = theme;
        }
        if let Some(show) = show_pane_titles {
            self.global_settings.show_pane_titles = show;
        }
        if let Some(enable) = enable_animations {
            self.global_settings.enable_animations = enable;
        }
        self.notify();
    }

    /// Drop every pane and rebuild the default layout. Global settings
    /// are kept.
    pub fn reset_to_default(&mut self) {
        self.panes.clear();
        self.is_resizing = false;
        self.install_default_layout();
        self.notify();
    }

    // --- Export / import ---

    pub fn export_layout(&self) -> LayoutConfig {
        LayoutConfig {
            global_settings: Some(self.global_settings.clone()),
            panes: self.panes.clone(),
        }
    }

    /// Replace every pane; settings are replaced only when present.
    pub fn import_layout(&mut self, config: LayoutConfig) {
        let LayoutConfig {
            global_settings,
            mut panes,
        } = config;
        for pane in &mut panes {
            pane.repair();
        }
        self.panes = panes;
        if let Some(settings) = global_settings {
            self.global_settings = settings;
        }
        tracing::info!(panes = self.panes.len(), "imported layout");
        self.notify();
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export_layout_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(&self.export_layout())?)
    }

    /// # Errors
    /// Returns an error if `json` is not a layout; the layout is unchanged.
    pub fn import_layout_json(&mut self, json: &str) -> Result<(), SessionError> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        self.import_layout(config);
        Ok(())
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::new()
    }
}

fn default_panes() -> Vec<(PanePosition, &'static str, PaneDimensions, Option<DefaultTab>)> {
    let side = |height, min_height| PaneDimensions::sized(300.0, height).with_min(200.0, min_height);
    let bottom = PaneDimensions::sized(400.0, 200.0).with_min(300.0, 150.0);
    vec![
        (
            PanePosition::TopMenu,
            "Menu",
            PaneDimensions {
                height: Some(60.0),
                min_height: Some(40.0),
                max_height: Some(100.0),
                ..PaneDimensions::default()
            },
            Some(DefaultTab::new("Main Menu", "TopMenu").fixed()),
        ),
        (PanePosition::LeftTop, "Left Top", side(300.0, 200.0), None),
        (PanePosition::LeftBottom, "Left Bottom", side(200.0, 150.0), None),
        (PanePosition::RightTop, "Right Top", side(300.0, 200.0), None),
        (PanePosition::RightBottom, "Right Bottom", side(200.0, 150.0), None),
        (PanePosition::BottomLeft, "Bottom Left", bottom, None),
        (PanePosition::BottomRight, "Bottom Right", bottom, None),
        (
            PanePosition::Center,
            "Code Editor",
            PaneDimensions {
                min_width: Some(400.0),
                min_height: Some(300.0),
                ..PaneDimensions::default()
            },
            Some(DefaultTab::new("Editor Placeholder", "EditorPlaceholder").fixed()),
        ),
    ]
}
