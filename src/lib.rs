// Magpie - file-manager companion engine for screen readers.
//
// The host screen reader feeds gestures and focus events into an Engine;
// magpie resolves the file manager's state through the automation traits
// in `explorer`, disambiguates single from double taps in `gesture`, and
// performs the file operations in `ops`, speaking results through the
// host's speech trait.

mod config;
mod engine;
mod explorer;
mod gesture;
mod menu;
mod ops;
mod schedule;
mod speech;

#[cfg(test)]
mod test_utils;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

pub use config::{MagpieConfig, SettingsError, SettingsStore};
pub use engine::{Engine, EngineBuilder};
pub use explorer::{
    AccessibilityQuery, ExplorerLocator, FocusedWindow, LocatorConfig, SelectedItem, Selection,
    ShellDocument, ShellWindow, ShellWindows, WindowHandle,
};
pub use gesture::{EnigoReplay, Gesture, GestureId, KeyCombo, KeyReplay, Modifier, ReplayError};
pub use menu::{menu_entries, MenuEntry, MenuItem, UiHost};
pub use ops::{
    ArboardClipboard, ClipboardError, ClipboardSink, CreateFileRequest, RenameRequest,
    RenameTarget,
};
pub use schedule::{Scheduler, TaskHandle, ThreadScheduler};
pub use speech::{SpeechOutput, ToneOutput};
