use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form props handed to a tab's component.
pub type ComponentProps = Map<String, Value>;

/// A tab inside a pane, naming the component it shows.
///
/// Only the component type and props are kept; live component instances
/// belong to the UI and are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneTab {
    pub id: String,
    pub pane_id: String,
    pub title: String,
    pub component_type: String,
    #[serde(default)]
    pub component_props: ComponentProps,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub order: u64,
    #[serde(default = "closeable_by_default")]
    pub is_closeable: bool,
}

const fn closeable_by_default() -> bool {
    true
}

impl PaneTab {
    pub fn new(
        id: impl Into<String>,
        pane_id: impl Into<String>,
        title: impl Into<String>,
        component_type: impl Into<String>,
        order: u64,
    ) -> Self {
        Self {
            id: id.into(),
            pane_id: pane_id.into(),
            title: title.into(),
            component_type: component_type.into(),
            component_props: ComponentProps::new(),
            is_active: false,
            is_pinned: false,
            order,
            is_closeable: true,
        }
    }

    pub fn with_props(mut self, props: ComponentProps) -> Self {
        self.component_props = props;
        self
    }

    pub const fn closeable(mut self, closeable: bool) -> Self {
        self.is_closeable = closeable;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Merge `props` over the current props; existing keys are replaced.
    pub fn set_component_props(&mut self, props: ComponentProps) {
        self.component_props.extend(props);
    }

    pub const fn toggle_pin(&mut self) {
        self.is_pinned = !self.is_pinned;
    }

    pub const fn set_pinned(&mut self, pinned: bool) {
        self.is_pinned = pinned;
    }

    pub const fn set_order(&mut self, order: u64) {
        self.order = order;
    }

    pub(crate) const fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> ComponentProps {
        match value {
            Value::Object(map) => map,
            _ => panic!("props must be an object"),
        }
    }

    #[test]
    fn test_set_component_props_merges() {
        let mut tab = PaneTab::new("center-tab-1", "center", "Editor", "CodeEditor", 0)
            .with_props(props(json!({"fontSize": 12, "theme": "dark"})));
        tab.set_component_props(props(json!({"fontSize": 14, "wrap": true})));
        assert_eq!(
            Value::Object(tab.component_props),
            json!({"fontSize": 14, "theme": "dark", "wrap": true})
        );
    }

    #[test]
    fn test_toggle_pin() {
        let mut tab = PaneTab::new("p-tab-1", "p", "Log", "Console", 0);
        tab.toggle_pin();
        assert!(tab.is_pinned);
        tab.toggle_pin();
        assert!(!tab.is_pinned);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let tab: PaneTab = serde_json::from_value(json!({
            "id": "p-tab-1",
            "paneId": "p",
            "title": "Log",
            "componentType": "Console"
        }))
        .unwrap();
        assert!(tab.is_closeable);
        assert!(!tab.is_active);
        assert!(tab.component_props.is_empty());
    }
}
