// Seams over the desktop accessibility and shell automation layers.
//
// Shell windows and documents are borrowed from the host platform and can
// die or mutate at any moment, so every accessor returns an Option and
// implementations absorb the underlying platform error instead of raising
// it. Callers treat None as "this candidate failed, try the next one."

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque native window identifier. Correlation key between the
/// accessibility focus/foreground object and a shell automation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

/// Focus or foreground object as reported by the accessibility layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusedWindow {
    /// Application name, e.g. "explorer"
    pub application: String,
    pub handle: WindowHandle,
}

/// One entry in the active folder view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    pub name: String,
    pub path: PathBuf,
}

/// Accessibility-tree focus and foreground queries.
pub trait AccessibilityQuery: Send + Sync {
    fn focus_object(&self) -> Option<FocusedWindow>;
    fn foreground_object(&self) -> Option<FocusedWindow>;
}

/// Automation root object enumerating top-level shell windows.
pub trait ShellWindows: Send + Sync {
    /// Windows that fail to materialize are skipped by the implementation,
    /// never surfaced as an error.
    fn windows(&self) -> Vec<Arc<dyn ShellWindow>>;
}

/// Borrowed reference to a live file-manager window.
///
/// Valid only while the underlying native window exists; never hold one
/// past the locator's cache TTLs.
pub trait ShellWindow: Send + Sync {
    fn handle(&self) -> Option<WindowHandle>;
    /// Cheap probe that the underlying window still exists.
    fn is_alive(&self) -> bool;
    fn document(&self) -> Option<Arc<dyn ShellDocument>>;
    /// Location as a URL, typically file-scheme.
    fn location_url(&self) -> Option<String>;
    /// Location as a display string; sometimes already a plain path.
    fn location_name(&self) -> Option<String>;
    fn is_visible(&self) -> bool;
    fn display_name(&self) -> Option<String>;
}

/// The active folder view inside a shell window.
pub trait ShellDocument: Send + Sync {
    /// Identity of the view, stable for the lifetime of one tab/document.
    fn identity(&self) -> u64;
    fn folder_path(&self) -> Option<PathBuf>;
    fn selected_count(&self) -> Option<usize>;
    /// Indexed read of the selection. The collection may mutate between
    /// the count and the access, so an index can stop being valid mid-read.
    fn selected_item(&self, index: usize) -> Option<SelectedItem>;
    fn item_count(&self) -> Option<usize>;
    fn item(&self, index: usize) -> Option<SelectedItem>;
    fn is_item_selected(&self, index: usize) -> Option<bool>;
    /// Returns false when the underlying platform call failed.
    fn set_item_selected(&self, index: usize, selected: bool) -> bool;
}
