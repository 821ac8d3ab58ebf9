// Resolves the live file-manager window, its folder path, and its
// selection through the automation seams, with a short-lived cache so a
// burst of gestures does not hammer the automation layer.
//
// Failure policy: automation flakiness degrades to None through the
// fallback chain; nothing in here returns an error or panics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::automation::{
    AccessibilityQuery, FocusedWindow, SelectedItem, ShellWindow, ShellWindows, WindowHandle,
};
use super::strategies;

/// Timing and identity knobs for the locator.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    /// Application name the accessibility layer reports for the file manager
    pub file_manager_app: String,
    /// Trust window for a cached shell window
    pub window_ttl: Duration,
    /// Trust window for a cached folder path
    pub path_ttl: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            file_manager_app: "explorer".to_string(),
            window_ttl: Duration::from_millis(1000),
            path_ttl: Duration::from_millis(2000),
        }
    }
}

impl LocatorConfig {
    pub fn from_config(config: &crate::config::MagpieConfig) -> Self {
        Self {
            file_manager_app: config.file_manager_app.clone(),
            window_ttl: Duration::from_millis(config.window_cache_ttl_ms),
            path_ttl: Duration::from_millis(config.path_cache_ttl_ms),
        }
    }
}

/// Result of a selection read: the resolved window plus the items, which
/// may legitimately be empty ("nothing selected" is not "no window").
pub struct Selection {
    pub window: Arc<dyn ShellWindow>,
    pub items: Vec<SelectedItem>,
}

struct CachedWindow {
    window: Arc<dyn ShellWindow>,
    handle: WindowHandle,
    stamp: Instant,
}

struct CachedPath {
    handle: WindowHandle,
    path: PathBuf,
    stamp: Instant,
}

#[derive(Default)]
struct LocatorCache {
    window: Option<CachedWindow>,
    path: Option<CachedPath>,
    document_identity: Option<u64>,
    last_focus_handle: Option<WindowHandle>,
}

/// Resolves file-manager state on demand. One instance per engine; all
/// methods take &self and guard the cache internally.
pub struct ExplorerLocator {
    accessibility: Arc<dyn AccessibilityQuery>,
    shell: Arc<dyn ShellWindows>,
    config: LocatorConfig,
    cache: Mutex<LocatorCache>,
}

impl ExplorerLocator {
    pub fn new(
        accessibility: Arc<dyn AccessibilityQuery>,
        shell: Arc<dyn ShellWindows>,
        config: LocatorConfig,
    ) -> Self {
        Self {
            accessibility,
            shell,
            config,
            cache: Mutex::new(LocatorCache::default()),
        }
    }

    fn is_file_manager(&self, object: &FocusedWindow) -> bool {
        object
            .application
            .eq_ignore_ascii_case(&self.config.file_manager_app)
    }

    /// The window the user is actually working in, or None when the file
    /// manager is not in front. Search order: fresh cache, foreground
    /// handle, focus handle, then the cache again as a last-resort guess.
    pub fn resolve_active_window(&self) -> Option<Arc<dyn ShellWindow>> {
        if let Some(window) = self.cached_window(self.config.window_ttl, true) {
            crate::trace!("Window cache hit");
            return Some(window);
        }

        let foreground = match self.accessibility.foreground_object() {
            Some(object) => object,
            None => {
                crate::debug!("No foreground object reported");
                return None;
            }
        };
        if !self.is_file_manager(&foreground) {
            crate::debug!("Foreground application is {}, not the file manager", foreground.application);
            return None;
        }

        let windows = self.shell.windows();
        if let Some(window) = find_live_window(&windows, foreground.handle) {
            return Some(self.remember_window(window, foreground.handle));
        }

        // Focus may sit in a child control whose top-level ancestor is not
        // the reported foreground window.
        if let Some(focus) = self.accessibility.focus_object() {
            if focus.handle != foreground.handle {
                if let Some(window) = find_live_window(&windows, focus.handle) {
                    return Some(self.remember_window(window, focus.handle));
                }
            }
        }

        if let Some(window) = self.cached_window(self.config.window_ttl, false) {
            crate::debug!("No handle matched, returning recent cached window");
            return Some(window);
        }

        crate::debug!("No shell window matched the foreground or focus handle");
        None
    }

    /// The current folder as an existing directory path, or None.
    ///
    /// A cached path younger than the path TTL is returned as-is while the
    /// foreground window is unchanged; otherwise each candidate window is
    /// run through the strategy chain in priority order.
    pub fn resolve_current_path(&self) -> Option<PathBuf> {
        let foreground = self.accessibility.foreground_object()?;
        if !self.is_file_manager(&foreground) {
            crate::debug!("Foreground application is {}, not the file manager", foreground.application);
            return None;
        }

        {
            let cache = self.cache.lock();
            if let Some(cached) = &cache.path {
                if cached.handle == foreground.handle
                    && cached.stamp.elapsed() < self.config.path_ttl
                {
                    crate::trace!("Path cache hit: {:?}", cached.path);
                    return Some(cached.path.clone());
                }
            }
        }

        let windows = self.shell.windows();
        let mut candidates: Vec<Arc<dyn ShellWindow>> = Vec::new();
        let mut seen = Vec::new();

        if let Some(window) = find_window(&windows, foreground.handle) {
            candidates.push(window);
            seen.push(foreground.handle);
        }
        if let Some(focus) = self.accessibility.focus_object() {
            if !seen.contains(&focus.handle) {
                if let Some(window) = find_window(&windows, focus.handle) {
                    candidates.push(window);
                    seen.push(focus.handle);
                }
            }
        }
        {
            let cache = self.cache.lock();
            if let Some(cached) = &cache.window {
                if cached.stamp.elapsed() < self.config.path_ttl && !seen.contains(&cached.handle) {
                    candidates.push(cached.window.clone());
                }
            }
        }

        for window in candidates {
            if let Some(path) = strategies::resolve_path_from(window.as_ref()) {
                let mut cache = self.cache.lock();
                cache.path = Some(CachedPath {
                    handle: foreground.handle,
                    path: path.clone(),
                    stamp: Instant::now(),
                });
                if let Some(handle) = window.handle() {
                    cache.window = Some(CachedWindow {
                        window,
                        handle,
                        stamp: Instant::now(),
                    });
                }
                return Some(path);
            }
            crate::debug!("Candidate window yielded no path, trying next");
        }

        crate::debug!("Every candidate window failed path resolution");
        None
    }

    /// The current selection, read tolerantly: the collection may mutate
    /// between the count and the per-index reads, in which case the items
    /// read so far are returned.
    ///
    /// None means no window or no document, or that the folder view just
    /// changed (logged, baselined, and reported as nothing-to-act-on for
    /// this one call).
    pub fn resolve_selection(&self) -> Option<Selection> {
        let window = self.resolve_active_window()?;
        let document = match window.document() {
            Some(document) => document,
            None => {
                crate::debug!("Resolved window has no document");
                return None;
            }
        };

        let identity = document.identity();
        {
            let mut cache = self.cache.lock();
            if let Some(previous) = cache.document_identity {
                if previous != identity {
                    cache.document_identity = Some(identity);
                    crate::info!("Folder view changed ({} -> {})", previous, identity);
                    return None;
                }
            } else {
                cache.document_identity = Some(identity);
            }
        }

        let count = match document.selected_count() {
            Some(count) => count,
            None => {
                crate::debug!("Selection count unavailable, treating as empty");
                0
            }
        };
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            match document.selected_item(index) {
                Some(item) => items.push(item),
                None => {
                    crate::debug!("Selection mutated during read at index {}", index);
                    break;
                }
            }
        }

        Some(Selection { window, items })
    }

    /// Focus moved; a different window handle invalidates the cache.
    pub fn note_focus_changed(&self, handle: Option<WindowHandle>) {
        let mut cache = self.cache.lock();
        if cache.last_focus_handle != handle {
            cache.last_focus_handle = handle;
            if cache.window.is_some() || cache.path.is_some() {
                crate::debug!("Focus moved to a different window, cache cleared");
            }
            cache.window = None;
            cache.path = None;
        }
    }

    /// Foreground changed; the cache is always stale after this.
    pub fn note_foreground_changed(&self) {
        self.clear_cache();
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.window = None;
        cache.path = None;
        crate::trace!("Locator cache cleared");
    }

    fn cached_window(&self, ttl: Duration, probe: bool) -> Option<Arc<dyn ShellWindow>> {
        let cache = self.cache.lock();
        let cached = cache.window.as_ref()?;
        if cached.stamp.elapsed() >= ttl {
            return None;
        }
        if probe && !cached.window.is_alive() {
            return None;
        }
        Some(cached.window.clone())
    }

    fn remember_window(
        &self,
        window: Arc<dyn ShellWindow>,
        handle: WindowHandle,
    ) -> Arc<dyn ShellWindow> {
        if let Some(name) = window.display_name() {
            crate::debug!("Remembering window {:?} ({})", handle, name);
        }
        let mut cache = self.cache.lock();
        cache.window = Some(CachedWindow {
            window: window.clone(),
            handle,
            stamp: Instant::now(),
        });
        window
    }
}

/// Handle match with a visible window and a live document, for acting
/// on a window. Entries for closed windows can linger in the shell
/// collection; they report themselves invisible.
fn find_live_window(
    windows: &[Arc<dyn ShellWindow>],
    handle: WindowHandle,
) -> Option<Arc<dyn ShellWindow>> {
    windows
        .iter()
        .find(|window| {
            window.handle() == Some(handle) && window.is_visible() && window.document().is_some()
        })
        .cloned()
}

/// Bare handle match, for path resolution where the URL and name
/// strategies work even without a document.
fn find_window(
    windows: &[Arc<dyn ShellWindow>],
    handle: WindowHandle,
) -> Option<Arc<dyn ShellWindow>> {
    windows
        .iter()
        .find(|window| window.handle() == Some(handle))
        .cloned()
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod tests;
