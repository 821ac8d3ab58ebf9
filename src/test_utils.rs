// Shared test doubles: a scriptable shell-automation tree backed by a
// real temp directory, plus recording speech and clipboard sinks.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::explorer::{
    AccessibilityQuery, FocusedWindow, SelectedItem, ShellDocument, ShellWindow, ShellWindows,
    WindowHandle,
};
use crate::menu::{MenuEntry, MenuItem, UiHost};
use crate::ops::{ClipboardError, ClipboardSink, CreateFileRequest, RenameRequest, RenameTarget};
use crate::speech::{SpeechOutput, ToneOutput};

/// Poll `condition` until it holds or the timeout runs out. Returns the
/// final evaluation, so asserting on it gives a clean failure.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

struct DocumentState {
    items: Vec<SelectedItem>,
    selected: Vec<bool>,
}

/// Folder view double. Items live in a real directory so the file
/// operations under test touch an actual filesystem.
pub struct FakeDocument {
    identity: u64,
    folder: Mutex<PathBuf>,
    state: Mutex<DocumentState>,
}

impl FakeDocument {
    /// `entries` pairs a file/folder name (must exist under `folder`)
    /// with its initial selection state.
    pub fn new(folder: &Path, entries: &[(&str, bool)]) -> Self {
        let items = entries
            .iter()
            .map(|(name, _)| SelectedItem {
                name: name.to_string(),
                path: folder.join(name),
            })
            .collect();
        let selected = entries.iter().map(|(_, selected)| *selected).collect();
        Self {
            identity: 1,
            folder: Mutex::new(folder.to_path_buf()),
            state: Mutex::new(DocumentState { items, selected }),
        }
    }

    pub fn selection_states(&self) -> Vec<bool> {
        self.state.lock().selected.clone()
    }

    /// Point the view at another folder, as if the user navigated.
    pub fn set_folder(&self, folder: &Path) {
        *self.folder.lock() = folder.to_path_buf();
    }
}

impl ShellDocument for FakeDocument {
    fn identity(&self) -> u64 {
        self.identity
    }
    fn folder_path(&self) -> Option<PathBuf> {
        Some(self.folder.lock().clone())
    }
    fn selected_count(&self) -> Option<usize> {
        Some(self.state.lock().selected.iter().filter(|s| **s).count())
    }
    fn selected_item(&self, index: usize) -> Option<SelectedItem> {
        let state = self.state.lock();
        state
            .items
            .iter()
            .zip(state.selected.iter())
            .filter(|(_, selected)| **selected)
            .map(|(item, _)| item.clone())
            .nth(index)
    }
    fn item_count(&self) -> Option<usize> {
        Some(self.state.lock().items.len())
    }
    fn item(&self, index: usize) -> Option<SelectedItem> {
        self.state.lock().items.get(index).cloned()
    }
    fn is_item_selected(&self, index: usize) -> Option<bool> {
        self.state.lock().selected.get(index).copied()
    }
    fn set_item_selected(&self, index: usize, selected: bool) -> bool {
        let mut state = self.state.lock();
        match state.selected.get_mut(index) {
            Some(slot) => {
                *slot = selected;
                true
            }
            None => false,
        }
    }
}

pub struct FakeWindow {
    handle: WindowHandle,
    document: Arc<FakeDocument>,
}

impl FakeWindow {
    pub fn new(handle: WindowHandle, document: Arc<FakeDocument>) -> Self {
        Self { handle, document }
    }
}

impl ShellWindow for FakeWindow {
    fn handle(&self) -> Option<WindowHandle> {
        Some(self.handle)
    }
    fn is_alive(&self) -> bool {
        true
    }
    fn document(&self) -> Option<Arc<dyn ShellDocument>> {
        Some(self.document.clone())
    }
    fn location_url(&self) -> Option<String> {
        None
    }
    fn location_name(&self) -> Option<String> {
        None
    }
    fn is_visible(&self) -> bool {
        true
    }
    fn display_name(&self) -> Option<String> {
        self.document
            .folder_path()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
    }
}

#[derive(Default)]
pub struct FakeShell {
    windows: Mutex<Vec<Arc<dyn ShellWindow>>>,
}

impl FakeShell {
    pub fn with_window(window: Arc<dyn ShellWindow>) -> Self {
        Self {
            windows: Mutex::new(vec![window]),
        }
    }
}

impl ShellWindows for FakeShell {
    fn windows(&self) -> Vec<Arc<dyn ShellWindow>> {
        self.windows.lock().clone()
    }
}

/// Focus/foreground double, both pointing at the same window by default.
pub struct FakeAccessibility {
    focus: Mutex<Option<FocusedWindow>>,
    foreground: Mutex<Option<FocusedWindow>>,
}

impl FakeAccessibility {
    pub fn on_file_manager(handle: WindowHandle) -> Self {
        let object = FocusedWindow {
            application: "explorer".to_string(),
            handle,
        };
        Self {
            focus: Mutex::new(Some(object.clone())),
            foreground: Mutex::new(Some(object)),
        }
    }

    pub fn elsewhere() -> Self {
        let object = FocusedWindow {
            application: "notepad".to_string(),
            handle: WindowHandle(999),
        };
        Self {
            focus: Mutex::new(Some(object.clone())),
            foreground: Mutex::new(Some(object)),
        }
    }
}

impl AccessibilityQuery for FakeAccessibility {
    fn focus_object(&self) -> Option<FocusedWindow> {
        self.focus.lock().clone()
    }
    fn foreground_object(&self) -> Option<FocusedWindow> {
        self.foreground.lock().clone()
    }
}

#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
}

impl RecordingSpeech {
    pub fn messages(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.spoken.lock().last().cloned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.spoken.lock().iter().any(|m| m == needle)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechOutput for RecordingSpeech {
    fn announce(&self, message: &str) {
        self.spoken.lock().push(message.to_string());
    }
    fn cancel_speech(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Tone sink that swallows beeps; worker tests only care about results.
#[derive(Default)]
pub struct SilentTones;

impl ToneOutput for SilentTones {
    fn beep(&self, _freq_hz: u32, _duration_ms: u32) {}
}

/// Scriptable host UI: dialogs answer with whatever response was staged
/// beforehand, a missing response means the user dismissed the surface.
#[derive(Default)]
pub struct FakeUi {
    menu_choice: Mutex<Option<MenuItem>>,
    menus_shown: AtomicUsize,
    rename_response: Mutex<Option<RenameRequest>>,
    rename_opened: AtomicUsize,
    last_rename_prefill: Mutex<Option<RenameTarget>>,
    create_response: Mutex<Option<CreateFileRequest>>,
    create_opened: AtomicUsize,
    last_create_prefill: Mutex<Option<CreateFileRequest>>,
    settings_opened: AtomicUsize,
}

impl FakeUi {
    pub fn choose(&self, item: MenuItem) {
        *self.menu_choice.lock() = Some(item);
    }

    pub fn respond_to_rename(&self, request: RenameRequest) {
        *self.rename_response.lock() = Some(request);
    }

    pub fn respond_to_create(&self, request: CreateFileRequest) {
        *self.create_response.lock() = Some(request);
    }

    pub fn menus_shown(&self) -> usize {
        self.menus_shown.load(Ordering::SeqCst)
    }

    pub fn rename_openings(&self) -> usize {
        self.rename_opened.load(Ordering::SeqCst)
    }

    pub fn rename_prefill(&self) -> Option<RenameTarget> {
        self.last_rename_prefill.lock().clone()
    }

    pub fn create_openings(&self) -> usize {
        self.create_opened.load(Ordering::SeqCst)
    }

    pub fn create_prefill(&self) -> Option<CreateFileRequest> {
        self.last_create_prefill.lock().clone()
    }

    pub fn settings_openings(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

impl UiHost for FakeUi {
    fn show_context_menu(
        &self,
        _entries: Vec<MenuEntry>,
        on_choice: Box<dyn FnOnce(Option<MenuItem>) + Send>,
    ) {
        self.menus_shown.fetch_add(1, Ordering::SeqCst);
        on_choice(self.menu_choice.lock().take());
    }

    fn open_rename_dialog(
        &self,
        prefill: RenameTarget,
        on_submit: Box<dyn FnOnce(Option<RenameRequest>) + Send>,
    ) {
        self.rename_opened.fetch_add(1, Ordering::SeqCst);
        *self.last_rename_prefill.lock() = Some(prefill);
        on_submit(self.rename_response.lock().take());
    }

    fn open_create_file_dialog(
        &self,
        prefill: CreateFileRequest,
        on_submit: Box<dyn FnOnce(Option<CreateFileRequest>) + Send>,
    ) {
        self.create_opened.fetch_add(1, Ordering::SeqCst);
        *self.last_create_prefill.lock() = Some(prefill);
        on_submit(self.create_response.lock().take());
    }

    fn open_settings(&self) {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<String> {
        self.texts.lock().last().cloned()
    }

    pub fn write_count(&self) -> usize {
        self.texts.lock().len()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("clipboard busy".to_string()));
        }
        self.texts.lock().push(text.to_string());
        Ok(())
    }
}
