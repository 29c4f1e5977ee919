use std::fmt;

use serde::{Deserialize, Serialize};

use super::pane_tab::{ComponentProps, PaneTab};
use crate::error::SessionError;

/// Fixed screen regions a pane can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanePosition {
    TopMenu,
    LeftTop,
    LeftBottom,
    RightTop,
    RightBottom,
    BottomLeft,
    BottomRight,
    Center,
}

impl PanePosition {
    pub const ALL: [Self; 8] = [
        Self::TopMenu,
        Self::LeftTop,
        Self::LeftBottom,
        Self::RightTop,
        Self::RightBottom,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Center,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopMenu => "top-menu",
            Self::LeftTop => "left-top",
            Self::LeftBottom => "left-bottom",
            Self::RightTop => "right-top",
            Self::RightBottom => "right-bottom",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for PanePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pane size and bounds in pixels. Unset fields are left to the UI.
///
/// Used both as the full value and as a patch: see [`Self::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
}

pub const DEFAULT_MIN_WIDTH: f64 = 200.0;
pub const DEFAULT_MIN_HEIGHT: f64 = 100.0;

impl PaneDimensions {
    pub const fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            min_width: None,
            min_height: None,
            max_width: None,
            max_height: None,
        }
    }

    pub const fn with_min(mut self, min_width: f64, min_height: f64) -> Self {
        self.min_width = Some(min_width);
        self.min_height = Some(min_height);
        self
    }

    /// Overwrite every field that is set in `patch`.
    pub fn merge(&mut self, patch: &Self) {
        let fields = [
            (&mut self.width, patch.width),
            (&mut self.height, patch.height),
            (&mut self.min_width, patch.min_width),
            (&mut self.min_height, patch.min_height),
            (&mut self.max_width, patch.max_width),
            (&mut self.max_height, patch.max_height),
        ];
        for (field, value) in fields {
            if value.is_some() {
                *field = value;
            }
        }
    }

    /// Fill unset minimums with the pane defaults.
    fn with_default_bounds(mut self) -> Self {
        self.min_width.get_or_insert(DEFAULT_MIN_WIDTH);
        self.min_height.get_or_insert(DEFAULT_MIN_HEIGHT);
        self
    }
}

/// A screen region holding its own tabs.
///
/// At most one tab is active; `active_tab_id` and the tabs' `is_active`
/// flags always agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pane {
    id: String,
    position: PanePosition,
    title: String,
    /// Insertion order; display order comes from each tab's `order`.
    tabs: Vec<PaneTab>,
    active_tab_id: Option<String>,
    is_visible: bool,
    is_collapsed: bool,
    is_resizable: bool,
    dimensions: PaneDimensions,
    next_tab_id: u64,
}

impl Pane {
    pub fn new(
        id: impl Into<String>,
        position: PanePosition,
        title: impl Into<String>,
        dimensions: PaneDimensions,
        is_resizable: bool,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            title: title.into(),
            tabs: Vec::new(),
            active_tab_id: None,
            is_visible: true,
            is_collapsed: false,
            is_resizable,
            dimensions: dimensions.with_default_bounds(),
            next_tab_id: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn position(&self) -> PanePosition {
        self.position
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub const fn dimensions(&self) -> &PaneDimensions {
        &self.dimensions
    }

    pub const fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub const fn is_collapsed(&self) -> bool {
        self.is_collapsed
    }

    pub const fn is_resizable(&self) -> bool {
        self.is_resizable
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    pub fn active_tab(&self) -> Option<&PaneTab> {
        self.active_tab_id.as_deref().and_then(|id| self.tab(id))
    }

    pub fn tab(&self, tab_id: &str) -> Option<&PaneTab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn tab_mut(&mut self, tab_id: &str) -> Option<&mut PaneTab> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    /// Tabs sorted by display order.
    pub fn tabs(&self) -> Vec<&PaneTab> {
        let mut tabs: Vec<_> = self.tabs.iter().collect();
        tabs.sort_by_key(|t| t.order);
        tabs
    }

    /// Tab ids in display order.
    pub fn tab_ids(&self) -> Vec<String> {
        self.tabs().into_iter().map(|t| t.id.clone()).collect()
    }

    pub fn has_tabs(&self) -> bool {
        !self.tabs.is_empty()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    // --- Tabs ---

    /// Append a tab and return its id, `<pane id>-tab-<n>`.
    ///
    /// The first tab of an empty pane becomes active.
    pub fn add_tab(
        &mut self,
        title: impl Into<String>,
        component_type: impl Into<String>,
        props: ComponentProps,
        closeable: bool,
    ) -> String {
        let tab_id = format!("{}-tab-{}", self.id, self.next_tab_id);
        self.next_tab_id += 1;
        let order = self.tabs.iter().map(|t| t.order + 1).max().unwrap_or(0);
        let mut tab = PaneTab::new(tab_id.clone(), self.id.clone(), title, component_type, order)
            .with_props(props)
            .closeable(closeable);
        if self.active_tab_id.is_none() {
            tab.set_active(true);
            self.active_tab_id = Some(tab_id.clone());
        }
        self.tabs.push(tab);
        tab_id
    }

    /// Remove a closeable tab. Removing the active tab activates the first
    /// remaining tab, if any.
    pub fn remove_tab(&mut self, tab_id: &str) -> bool {
        let Some(index) = self.tabs.iter().position(|t| t.id == tab_id) else {
            return false;
        };
        if !self.tabs[index].is_closeable {
            tracing::warn!(pane = %self.id, tab_id, "tab is not closeable");
            return false;
        }
        self.tabs.remove(index);
        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = None;
            if let Some(first) = self.tabs.first_mut() {
                first.set_active(true);
                self.active_tab_id = Some(first.id.clone());
            }
        }
        true
    }

    /// Activate `tab_id`, deactivating the previous active tab first.
    pub fn switch_to_tab(&mut self, tab_id: &str) -> bool {
        if self.tab(tab_id).is_none() {
            return false;
        }
        let previous = self.active_tab_id.take();
        if let Some(tab) = previous.as_deref().and_then(|id| self.tab_mut(id)) {
            tab.set_active(false);
        }
        if let Some(tab) = self.tab_mut(tab_id) {
            tab.set_active(true);
        }
        self.active_tab_id = Some(tab_id.to_string());
        true
    }

    /// Assign display order from the position of each id in `tab_ids`.
    pub fn reorder_tabs<S: AsRef<str>>(&mut self, tab_ids: &[S]) {
        for (order, id) in (0u64..).zip(tab_ids) {
            if let Some(tab) = self.tab_mut(id.as_ref()) {
                tab.set_order(order);
            }
        }
    }

    // --- Pane state ---

    pub fn set_dimensions(&mut self, patch: &PaneDimensions) {
        self.dimensions.merge(patch);
    }

    pub const fn toggle_visibility(&mut self) {
        self.is_visible = !self.is_visible;
    }

    pub const fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    pub const fn toggle_collapsed(&mut self) {
        self.is_collapsed = !self.is_collapsed;
    }

    pub const fn set_collapsed(&mut self, collapsed: bool) {
        self.is_collapsed = collapsed;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    // --- JSON ---

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a pane, re-deriving the active flags and tab counter.
    ///
    /// # Errors
    /// Returns an error if `json` is not a serialized pane.
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let mut pane: Self = serde_json::from_str(json)?;
        pane.repair();
        Ok(pane)
    }

    pub(crate) fn repair(&mut self) {
        if self
            .active_tab_id
            .as_deref()
            .is_some_and(|id| self.tab(id).is_none())
        {
            self.active_tab_id = None;
        }
        let active = self.active_tab_id.clone();
        for tab in &mut self.tabs {
            tab.pane_id.clone_from(&self.id);
            tab.set_active(active.as_deref() == Some(tab.id.as_str()));
        }
        let prefix = format!("{}-tab-", self.id);
        let highest = self
            .tabs
            .iter()
            .filter_map(|t| t.id.strip_prefix(&prefix)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_tab_id = self.next_tab_id.max(highest + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane() -> Pane {
        Pane::new("center", PanePosition::Center, "Code", PaneDimensions::default(), true)
    }

    fn add(pane: &mut Pane, title: &str, closeable: bool) -> String {
        pane.add_tab(title, "Widget", ComponentProps::new(), closeable)
    }

    fn active_flags(pane: &Pane) -> Vec<String> {
        pane.tabs()
            .into_iter()
            .filter(|t| t.is_active)
            .map(|t| t.id.clone())
            .collect()
    }

    // --- Construction ---

    #[test]
    fn test_new_pane_fills_min_bounds() {
        let p = pane();
        assert_eq!(p.dimensions().min_width, Some(200.0));
        assert_eq!(p.dimensions().min_height, Some(100.0));
        assert!(p.is_visible());
        assert!(!p.is_collapsed());
        assert!(!p.has_tabs());
    }

    #[test]
    fn test_explicit_min_bounds_are_kept() {
        let p = Pane::new(
            "x",
            PanePosition::TopMenu,
            "Menu",
            PaneDimensions::default().with_min(50.0, 40.0),
            false,
        );
        assert_eq!(p.dimensions().min_width, Some(50.0));
        assert_eq!(p.dimensions().min_height, Some(40.0));
        assert!(!p.is_resizable());
    }

    #[test]
    fn test_position_strings() {
        let names: Vec<_> = PanePosition::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names[0], "top-menu");
        assert_eq!(names[7], "center");
        let json = serde_json::to_string(&PanePosition::BottomRight).unwrap();
        assert_eq!(json, "\"bottom-right\"");
    }

    // --- Tabs ---

    #[test]
    fn test_add_tab_ids_and_first_active() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        let b = add(&mut p, "B", true);
        assert_eq!(a, "center-tab-1");
        assert_eq!(b, "center-tab-2");
        assert_eq!(p.active_tab_id(), Some(a.as_str()));
        assert_eq!(active_flags(&p), vec![a]);
    }

    #[test]
    fn test_remove_non_closeable_tab_is_refused() {
        let mut p = pane();
        let fixed = add(&mut p, "Fixed", false);
        let loose = add(&mut p, "Loose", true);
        assert!(!p.remove_tab(&fixed));
        assert!(p.switch_to_tab(&loose));
        assert!(p.remove_tab(&loose));
        assert_eq!(p.active_tab_id(), Some(fixed.as_str()));
        assert_eq!(active_flags(&p), vec![fixed]);
    }

    #[test]
    fn test_remove_last_tab_clears_active() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        assert!(p.remove_tab(&a));
        assert_eq!(p.active_tab_id(), None);
        assert!(!p.remove_tab(&a));
    }

    #[test]
    fn test_tab_ids_are_not_reused() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        p.remove_tab(&a);
        assert_eq!(add(&mut p, "B", true), "center-tab-2");
    }

    #[test]
    fn test_new_tab_orders_after_existing() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        let b = add(&mut p, "B", true);
        add(&mut p, "C", true);
        p.remove_tab(&a);
        let d = add(&mut p, "D", true);
        assert_eq!(p.tab(&b).unwrap().order, 1);
        assert_eq!(p.tab(&d).unwrap().order, 3);
        assert_eq!(p.tab_ids().last(), Some(&d));
    }

    #[test]
    fn test_switch_keeps_single_active_tab() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        let b = add(&mut p, "B", true);
        assert!(p.switch_to_tab(&b));
        assert_eq!(active_flags(&p), vec![b.clone()]);
        assert!(p.switch_to_tab(&a));
        assert_eq!(active_flags(&p), vec![a]);
        assert!(!p.switch_to_tab("missing"));
        assert_eq!(p.active_tab_id(), Some("center-tab-1"));
    }

    #[test]
    fn test_reorder_tabs() {
        let mut p = pane();
        let a = add(&mut p, "A", true);
        let b = add(&mut p, "B", true);
        let c = add(&mut p, "C", true);
        p.reorder_tabs(&[c.as_str(), a.as_str(), b.as_str()]);
        assert_eq!(p.tab_ids(), vec![c, a, b]);
    }

    // --- Pane state ---

    #[test]
    fn test_dimension_patch_merges() {
        let mut p = pane();
        p.set_dimensions(&PaneDimensions::sized(300.0, 200.0));
        p.set_dimensions(&PaneDimensions {
            height: Some(250.0),
            ..PaneDimensions::default()
        });
        let dims = p.dimensions();
        assert_eq!(dims.width, Some(300.0));
        assert_eq!(dims.height, Some(250.0));
        assert_eq!(dims.min_width, Some(200.0));
    }

    #[test]
    fn test_visibility_and_collapse_are_independent() {
        let mut p = pane();
        p.toggle_collapsed();
        p.toggle_visibility();
        assert!(p.is_collapsed());
        assert!(!p.is_visible());
        p.set_visible(true);
        assert!(p.is_collapsed());
    }

    // --- JSON ---

    #[test]
    fn test_json_roundtrip() {
        let mut p = pane();
        add(&mut p, "A", false);
        let b = add(&mut p, "B", true);
        p.switch_to_tab(&b);
        p.toggle_collapsed();
        let restored = Pane::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(restored, p);
    }

    #[test]
    fn test_from_json_repairs_active_flags() {
        let json = r#"{
            "id": "left-top",
            "position": "left-top",
            "title": "Files",
            "tabs": [
                {"id": "left-top-tab-4", "paneId": "x", "title": "A", "componentType": "W", "isActive": true},
                {"id": "left-top-tab-7", "paneId": "x", "title": "B", "componentType": "W", "isActive": true}
            ],
            "activeTabId": "left-top-tab-7",
            "isVisible": true,
            "isCollapsed": false,
            "isResizable": true,
            "dimensions": {},
            "nextTabId": 1
        }"#;
        let mut p = Pane::from_json(json).unwrap();
        assert_eq!(active_flags(&p), vec!["left-top-tab-7".to_string()]);
        assert!(p.tabs().iter().all(|t| t.pane_id == "left-top"));
        assert_eq!(add(&mut p, "C", true), "left-top-tab-8");
    }
}
