//! Screen layout: named panes, each holding tabs that show UI components.
//!
//! Pane tabs reference component types and props, never buffers. The
//! [`LayoutManager`] starts with an eight-pane layout whose menu and editor
//! panes carry tabs that cannot be closed.

mod manager;
mod pane;
mod pane_tab;

pub use manager::{
    CreatePaneOptions, DefaultTab, GlobalSettings, GlobalSettingsPatch, LayoutConfig,
    LayoutManager, LayoutSnapshot, pane_id_for,
};
pub use pane::{DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH, Pane, PaneDimensions, PanePosition};
pub use pane_tab::{ComponentProps, PaneTab};
