// Gesture routing.
//
// One router owns the focus gate and the three per-identity tap
// disambiguators. Gestures arriving while some other application holds
// focus are replayed to the system unmodified instead of being handled.

use std::sync::Arc;
use std::time::Duration;

use crate::explorer::AccessibilityQuery;
use crate::gesture::{Gesture, GestureId, KeyReplay, TapDisambiguator};
use crate::schedule::Scheduler;

/// Delay between a double tap resolving to "compress" and the action
/// starting, so the dispatch leaves the tap burst's callstack first.
pub const COMPRESS_DISPATCH_DELAY_MS: u64 = 50;

type GestureAction = Arc<dyn Fn() + Send + Sync>;

/// Resolved callbacks for the logical gestures, wired in by the engine.
pub struct GestureHandlers {
    pub say_size: GestureAction,
    pub compress: GestureAction,
    pub copy_names: GestureAction,
    pub copy_address: GestureAction,
    pub copy_content: GestureAction,
    pub invert_selection: GestureAction,
    pub context_menu: GestureAction,
    pub rename: GestureAction,
}

pub struct GestureRouter {
    accessibility: Arc<dyn AccessibilityQuery>,
    replay: Arc<dyn KeyReplay>,
    file_manager_app: String,
    size_or_compress: TapDisambiguator,
    copy_or_address: TapDisambiguator,
    content_or_invert: TapDisambiguator,
    context_menu: GestureAction,
    rename: GestureAction,
}

impl GestureRouter {
    pub fn new(
        accessibility: Arc<dyn AccessibilityQuery>,
        replay: Arc<dyn KeyReplay>,
        scheduler: Arc<dyn Scheduler>,
        handlers: GestureHandlers,
        file_manager_app: impl Into<String>,
        tap_window: Duration,
    ) -> Self {
        // Compress runs just after its burst instead of inside it; the
        // dispatch is pushed back through the scheduler.
        let deferred_compress = {
            let scheduler = scheduler.clone();
            let compress = handlers.compress;
            move || {
                let compress = compress.clone();
                scheduler.call_later(
                    Duration::from_millis(COMPRESS_DISPATCH_DELAY_MS),
                    Box::new(move || compress()),
                );
            }
        };
        let say_size = handlers.say_size;
        let copy_names = handlers.copy_names;
        let copy_address = handlers.copy_address;
        let copy_content = handlers.copy_content;
        let invert_selection = handlers.invert_selection;

        Self {
            accessibility,
            replay,
            file_manager_app: file_manager_app.into(),
            size_or_compress: TapDisambiguator::new(
                tap_window,
                scheduler.clone(),
                move || say_size(),
                deferred_compress,
            ),
            copy_or_address: TapDisambiguator::new(
                tap_window,
                scheduler.clone(),
                move || copy_names(),
                move || copy_address(),
            ),
            content_or_invert: TapDisambiguator::new(
                tap_window,
                scheduler,
                move || copy_content(),
                move || invert_selection(),
            ),
            context_menu: handlers.context_menu,
            rename: handlers.rename,
        }
    }

    /// Route one gesture event from the host.
    pub fn handle_gesture(&self, gesture: &Gesture) {
        if !self.file_manager_focused() {
            crate::debug!(
                "Focus is outside the file manager, replaying {:?}",
                gesture.id
            );
            if let Err(e) = self.replay.replay(&gesture.combo) {
                crate::warn!("Pass-through replay failed: {}", e);
            }
            return;
        }

        match gesture.id {
            GestureId::SizeOrCompress => {
                self.size_or_compress.register_tap();
            }
            GestureId::CopyOrAddress => {
                self.copy_or_address.register_tap();
            }
            GestureId::ContentOrInvert => {
                self.content_or_invert.register_tap();
            }
            GestureId::ContextMenu => (self.context_menu)(),
            GestureId::Rename => (self.rename)(),
        }
    }

    /// Drop any armed tap timers. Used on shutdown so no single-tap
    /// action fires after the engine has stopped.
    pub fn reset_taps(&self) {
        self.size_or_compress.reset();
        self.copy_or_address.reset();
        self.content_or_invert.reset();
    }

    fn file_manager_focused(&self) -> bool {
        match self.accessibility.focus_object() {
            Some(focus) => focus
                .application
                .eq_ignore_ascii_case(&self.file_manager_app),
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
