// File-manager state resolution: automation seams, path strategies, and
// the caching locator built on top of them.

mod automation;
mod locator;
pub mod strategies;

pub use automation::{
    AccessibilityQuery, FocusedWindow, SelectedItem, ShellDocument, ShellWindow, ShellWindows,
    WindowHandle,
};
pub use locator::{ExplorerLocator, LocatorConfig, Selection};
