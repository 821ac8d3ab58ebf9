// Locator tests run against a fake automation tree with failure
// injection and call counters, so cache behavior and the fallback order
// are observable without a real desktop.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::{tempdir, TempDir};

use super::*;
use crate::explorer::automation::ShellDocument;

#[derive(Default)]
struct FakeDocument {
    identity: u64,
    folder: Option<PathBuf>,
    selected: Vec<SelectedItem>,
    fail_selected_count: bool,
    fail_from_index: Option<usize>,
    folder_reads: AtomicUsize,
}

impl ShellDocument for FakeDocument {
    fn identity(&self) -> u64 {
        self.identity
    }
    fn folder_path(&self) -> Option<PathBuf> {
        self.folder_reads.fetch_add(1, Ordering::SeqCst);
        self.folder.clone()
    }
    fn selected_count(&self) -> Option<usize> {
        if self.fail_selected_count {
            None
        } else {
            Some(self.selected.len())
        }
    }
    fn selected_item(&self, index: usize) -> Option<SelectedItem> {
        if let Some(fail_from) = self.fail_from_index {
            if index >= fail_from {
                return None;
            }
        }
        self.selected.get(index).cloned()
    }
    fn item_count(&self) -> Option<usize> {
        Some(self.selected.len())
    }
    fn item(&self, index: usize) -> Option<SelectedItem> {
        self.selected.get(index).cloned()
    }
    fn is_item_selected(&self, _index: usize) -> Option<bool> {
        Some(true)
    }
    fn set_item_selected(&self, _index: usize, _selected: bool) -> bool {
        true
    }
}

struct FakeWindow {
    handle: Option<WindowHandle>,
    alive: AtomicBool,
    visible: AtomicBool,
    document: Mutex<Option<Arc<FakeDocument>>>,
    url: Option<String>,
    name: Option<String>,
    document_reads: AtomicUsize,
    url_reads: AtomicUsize,
}

impl FakeWindow {
    fn with_document(handle: u64, document: FakeDocument) -> Arc<Self> {
        Arc::new(Self {
            handle: Some(WindowHandle(handle)),
            alive: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            document: Mutex::new(Some(Arc::new(document))),
            url: None,
            name: None,
            document_reads: AtomicUsize::new(0),
            url_reads: AtomicUsize::new(0),
        })
    }

    fn with_url(handle: u64, url: &str) -> Arc<Self> {
        Arc::new(Self {
            handle: Some(WindowHandle(handle)),
            alive: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            document: Mutex::new(None),
            url: Some(url.to_string()),
            name: None,
            document_reads: AtomicUsize::new(0),
            url_reads: AtomicUsize::new(0),
        })
    }

    fn swap_document(&self, document: FakeDocument) {
        *self.document.lock() = Some(Arc::new(document));
    }

    fn strategy_reads(&self) -> usize {
        self.document_reads.load(Ordering::SeqCst) + self.url_reads.load(Ordering::SeqCst)
    }
}

impl ShellWindow for FakeWindow {
    fn handle(&self) -> Option<WindowHandle> {
        self.handle
    }
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
    fn document(&self) -> Option<Arc<dyn ShellDocument>> {
        self.document_reads.fetch_add(1, Ordering::SeqCst);
        self.document
            .lock()
            .clone()
            .map(|d| d as Arc<dyn ShellDocument>)
    }
    fn location_url(&self) -> Option<String> {
        self.url_reads.fetch_add(1, Ordering::SeqCst);
        self.url.clone()
    }
    fn location_name(&self) -> Option<String> {
        self.name.clone()
    }
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
    fn display_name(&self) -> Option<String> {
        Some("File Explorer".to_string())
    }
}

#[derive(Default)]
struct FakeAccessibility {
    focus: Mutex<Option<FocusedWindow>>,
    foreground: Mutex<Option<FocusedWindow>>,
}

impl FakeAccessibility {
    fn set_foreground(&self, object: Option<FocusedWindow>) {
        *self.foreground.lock() = object;
    }
    fn set_focus(&self, object: Option<FocusedWindow>) {
        *self.focus.lock() = object;
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
struct FakeShell {
    windows: Mutex<Vec<Arc<dyn ShellWindow>>>,
    enumerations: AtomicUsize,
}

impl FakeShell {
    fn set_windows(&self, windows: Vec<Arc<dyn ShellWindow>>) {
        *self.windows.lock() = windows;
    }
    fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl ShellWindows for FakeShell {
    fn windows(&self) -> Vec<Arc<dyn ShellWindow>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().clone()
    }
}

fn explorer_object(handle: u64) -> FocusedWindow {
    FocusedWindow {
        application: "explorer".to_string(),
        handle: WindowHandle(handle),
    }
}

fn item(name: &str) -> SelectedItem {
    SelectedItem {
        name: name.to_string(),
        path: PathBuf::from("/tmp").join(name),
    }
}

struct Fixture {
    accessibility: Arc<FakeAccessibility>,
    shell: Arc<FakeShell>,
    locator: ExplorerLocator,
    _dir: TempDir,
    folder: PathBuf,
}

fn fixture_with_config(config: LocatorConfig) -> Fixture {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("docs");
    std::fs::create_dir_all(&folder).unwrap();

    let accessibility = Arc::new(FakeAccessibility::default());
    let shell = Arc::new(FakeShell::default());
    accessibility.set_foreground(Some(explorer_object(1)));
    accessibility.set_focus(Some(explorer_object(1)));

    let locator = ExplorerLocator::new(accessibility.clone(), shell.clone(), config);
    Fixture {
        accessibility,
        shell,
        locator,
        _dir: dir,
        folder,
    }
}

fn fixture() -> Fixture {
    fixture_with_config(LocatorConfig::default())
}

fn document_in(folder: &PathBuf, identity: u64, selected: Vec<SelectedItem>) -> FakeDocument {
    FakeDocument {
        identity,
        folder: Some(folder.clone()),
        selected,
        ..FakeDocument::default()
    }
}

#[test]
fn none_when_foreground_is_not_the_file_manager() {
    let fx = fixture();
    fx.accessibility.set_foreground(Some(FocusedWindow {
        application: "notepad".to_string(),
        handle: WindowHandle(1),
    }));

    assert!(fx.locator.resolve_active_window().is_none());
    assert!(fx.locator.resolve_current_path().is_none());
}

#[test]
fn none_when_there_is_no_foreground_object() {
    let fx = fixture();
    fx.accessibility.set_foreground(None);
    assert!(fx.locator.resolve_active_window().is_none());
    assert!(fx.locator.resolve_current_path().is_none());
}

#[test]
fn resolves_window_by_foreground_handle() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    let resolved = fx.locator.resolve_active_window().expect("window resolves");
    assert_eq!(resolved.handle(), Some(WindowHandle(1)));
}

#[test]
fn falls_back_to_the_focus_handle() {
    let fx = fixture();
    // Foreground reports a handle no shell window has; focus sits in a
    // child control of window 2.
    fx.accessibility.set_foreground(Some(explorer_object(99)));
    fx.accessibility.set_focus(Some(explorer_object(2)));
    let window = FakeWindow::with_document(2, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    let resolved = fx.locator.resolve_active_window().expect("focus fallback");
    assert_eq!(resolved.handle(), Some(WindowHandle(2)));
}

#[test]
fn windows_without_a_document_are_skipped_for_activation() {
    let fx = fixture();
    let bare = FakeWindow::with_url(1, "file:///tmp");
    fx.shell.set_windows(vec![bare]);
    assert!(fx.locator.resolve_active_window().is_none());
}

#[test]
fn invisible_windows_are_skipped_for_activation() {
    // A window that is closing lingers in the shell collection for a
    // moment with its visibility already dropped.
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    window.visible.store(false, Ordering::SeqCst);
    fx.shell.set_windows(vec![window]);
    assert!(fx.locator.resolve_active_window().is_none());
}

#[test]
fn second_resolution_within_ttl_uses_the_cache() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    fx.locator.resolve_active_window().expect("first");
    fx.locator.resolve_active_window().expect("second");
    assert_eq!(
        fx.shell.enumeration_count(),
        1,
        "second call must be served from the cache"
    );
}

#[test]
fn dead_cached_window_is_re_resolved() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window.clone()]);

    fx.locator.resolve_active_window().expect("first");
    window.alive.store(false, Ordering::SeqCst);
    fx.locator.resolve_active_window().expect("re-resolved");
    assert_eq!(fx.shell.enumeration_count(), 2);
}

#[test]
fn window_cache_expires() {
    let config = LocatorConfig {
        window_ttl: Duration::from_millis(30),
        ..LocatorConfig::default()
    };
    let fx = fixture_with_config(config);
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    fx.locator.resolve_active_window().expect("first");
    thread::sleep(Duration::from_millis(60));
    fx.locator.resolve_active_window().expect("after expiry");
    assert_eq!(fx.shell.enumeration_count(), 2);
}

#[test]
fn recent_cached_window_is_the_last_resort_guess() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window.clone()]);
    fx.locator.resolve_active_window().expect("prime the cache");

    // The window dies and no handle matches anymore, but the entry is
    // still young: return it as a guess rather than nothing.
    window.alive.store(false, Ordering::SeqCst);
    fx.shell.set_windows(vec![]);
    fx.accessibility.set_foreground(Some(explorer_object(42)));
    fx.accessibility.set_focus(Some(explorer_object(42)));

    let guessed = fx.locator.resolve_active_window().expect("stale guess");
    assert_eq!(guessed.handle(), Some(WindowHandle(1)));
}

#[test]
fn current_path_comes_from_the_document() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    assert_eq!(fx.locator.resolve_current_path(), Some(fx.folder.clone()));
}

#[test]
fn current_path_falls_back_to_the_location_url() {
    let fx = fixture();
    let url = format!("file://{}", fx.folder.display());
    let window = FakeWindow::with_url(1, &url);
    fx.shell.set_windows(vec![window]);

    assert_eq!(fx.locator.resolve_current_path(), Some(fx.folder.clone()));
}

#[test]
fn path_cache_short_circuits_the_strategy_chain() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window.clone()]);

    let first = fx.locator.resolve_current_path().expect("first");
    let reads_after_first = window.strategy_reads();
    let enumerations_after_first = fx.shell.enumeration_count();

    let second = fx.locator.resolve_current_path().expect("second");
    assert_eq!(first, second);
    assert_eq!(
        window.strategy_reads(),
        reads_after_first,
        "no strategy may run on a fresh path cache"
    );
    assert_eq!(fx.shell.enumeration_count(), enumerations_after_first);
}

#[test]
fn path_cache_expires() {
    let config = LocatorConfig {
        path_ttl: Duration::from_millis(30),
        ..LocatorConfig::default()
    };
    let fx = fixture_with_config(config);
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window.clone()]);

    fx.locator.resolve_current_path().expect("first");
    let reads_after_first = window.strategy_reads();
    thread::sleep(Duration::from_millis(60));
    fx.locator.resolve_current_path().expect("after expiry");
    assert!(
        window.strategy_reads() > reads_after_first,
        "expired path cache must re-run the strategies"
    );
}

#[test]
fn path_cache_is_keyed_to_the_foreground_handle() {
    let fx = fixture();
    let second_folder = fx._dir.path().join("other");
    std::fs::create_dir_all(&second_folder).unwrap();

    let first = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    let second = FakeWindow::with_document(2, document_in(&second_folder, 2, vec![]));
    fx.shell.set_windows(vec![first, second]);

    assert_eq!(fx.locator.resolve_current_path(), Some(fx.folder.clone()));

    fx.accessibility.set_foreground(Some(explorer_object(2)));
    fx.accessibility.set_focus(Some(explorer_object(2)));
    assert_eq!(fx.locator.resolve_current_path(), Some(second_folder));
}

#[test]
fn selection_distinguishes_empty_from_no_window() {
    let fx = fixture();
    assert!(
        fx.locator.resolve_selection().is_none(),
        "no shell windows at all"
    );

    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);
    let selection = fx.locator.resolve_selection().expect("window with nothing selected");
    assert!(selection.items.is_empty());
    assert_eq!(selection.window.handle(), Some(WindowHandle(1)));
}

#[test]
fn selection_reads_the_items_in_order() {
    let fx = fixture();
    let window = FakeWindow::with_document(
        1,
        document_in(&fx.folder, 1, vec![item("a.txt"), item("b.txt")]),
    );
    fx.shell.set_windows(vec![window]);

    let selection = fx.locator.resolve_selection().expect("selection");
    let names: Vec<_> = selection.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
}

#[test]
fn selection_stops_early_when_the_collection_mutates() {
    let fx = fixture();
    let document = FakeDocument {
        identity: 1,
        folder: Some(fx.folder.clone()),
        selected: vec![item("a"), item("b"), item("c")],
        fail_from_index: Some(2),
        ..FakeDocument::default()
    };
    let window = FakeWindow::with_document(1, document);
    fx.shell.set_windows(vec![window]);

    let selection = fx.locator.resolve_selection().expect("partial selection");
    assert_eq!(selection.items.len(), 2, "stops at the first dead index");
}

#[test]
fn selected_count_failure_degrades_to_empty() {
    let fx = fixture();
    let document = FakeDocument {
        identity: 1,
        folder: Some(fx.folder.clone()),
        selected: vec![item("a")],
        fail_selected_count: true,
        ..FakeDocument::default()
    };
    let window = FakeWindow::with_document(1, document);
    fx.shell.set_windows(vec![window]);

    let selection = fx.locator.resolve_selection().expect("window still resolves");
    assert!(selection.items.is_empty());
}

#[test]
fn document_change_yields_one_empty_read_then_recovers() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![item("a")]));
    fx.shell.set_windows(vec![window.clone()]);

    assert!(fx.locator.resolve_selection().is_some(), "baseline read");

    window.swap_document(document_in(&fx.folder, 2, vec![item("b")]));
    assert!(
        fx.locator.resolve_selection().is_none(),
        "tab change reads as nothing-to-act-on once"
    );
    let recovered = fx.locator.resolve_selection().expect("next read proceeds");
    assert_eq!(recovered.items[0].name, "b");
}

#[test]
fn focus_moving_to_another_window_clears_the_cache() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    fx.locator.resolve_active_window().expect("prime");
    fx.locator.note_focus_changed(Some(WindowHandle(7)));
    fx.locator.resolve_active_window().expect("re-resolve");
    assert_eq!(fx.shell.enumeration_count(), 2);
}

#[test]
fn focus_event_on_the_same_window_keeps_the_cache() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    fx.locator.note_focus_changed(Some(WindowHandle(1)));
    fx.locator.resolve_active_window().expect("prime");
    fx.locator.note_focus_changed(Some(WindowHandle(1)));
    fx.locator.resolve_active_window().expect("cached");
    assert_eq!(fx.shell.enumeration_count(), 1);
}

#[test]
fn foreground_event_always_clears_the_cache() {
    let fx = fixture();
    let window = FakeWindow::with_document(1, document_in(&fx.folder, 1, vec![]));
    fx.shell.set_windows(vec![window]);

    fx.locator.resolve_active_window().expect("prime");
    fx.locator.note_foreground_changed();
    fx.locator.resolve_active_window().expect("re-resolve");
    assert_eq!(fx.shell.enumeration_count(), 2);
}
