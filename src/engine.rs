// Engine assembly and the host event entry points.
//
// The host supplies the outward-facing seams: speech, tones, the
// accessibility tree, the shell-window enumeration, and the UI
// surfaces. The builder fills every remaining slot with the real
// implementation (system clipboard, thread scheduler, enigo replay,
// default configuration). Once built, the engine is driven entirely
// by host events: gestures, focus changes, foreground changes, and
// menu picks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MagpieConfig;
use crate::explorer::{
    AccessibilityQuery, ExplorerLocator, LocatorConfig, ShellWindows, WindowHandle,
};
use crate::gesture::{EnigoReplay, Gesture, GestureHandlers, GestureRouter, KeyReplay};
use crate::menu::{self, MenuItem, UiHost};
use crate::ops::{Actions, ArboardClipboard, ClipboardSink};
use crate::schedule::{Scheduler, ThreadScheduler};
use crate::speech::{Silencer, SpeechOutput, ToneOutput};

type MenuOpener = Arc<dyn Fn() + Send + Sync>;

/// Assembles an [`Engine`] from the host-provided seams. Every
/// `with_*` slot left unset falls back to the real implementation.
pub struct EngineBuilder {
    speech: Arc<dyn SpeechOutput>,
    tones: Arc<dyn ToneOutput>,
    accessibility: Arc<dyn AccessibilityQuery>,
    shell: Arc<dyn ShellWindows>,
    ui: Arc<dyn UiHost>,
    clipboard: Option<Arc<dyn ClipboardSink>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    replay: Option<Arc<dyn KeyReplay>>,
    config: Option<MagpieConfig>,
}

impl EngineBuilder {
    /// Replace the system clipboard (builder pattern)
    pub fn with_clipboard(mut self, clipboard: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Replace the thread scheduler (builder pattern)
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Replace the enigo key replay (builder pattern)
    pub fn with_replay(mut self, replay: Arc<dyn KeyReplay>) -> Self {
        self.replay = Some(replay);
        self
    }

    /// Run with a specific configuration instead of the defaults
    pub fn with_config(mut self, config: MagpieConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Engine {
        let config = self.config.unwrap_or_default();
        let clipboard = self
            .clipboard
            .unwrap_or_else(|| Arc::new(ArboardClipboard::new()));
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(ThreadScheduler::new()));
        let replay = self.replay.unwrap_or_else(|| Arc::new(EnigoReplay::new()));

        let locator = Arc::new(ExplorerLocator::new(
            self.accessibility.clone(),
            self.shell,
            LocatorConfig::from_config(&config),
        ));
        let silencer = Arc::new(Silencer::new(
            self.speech.clone(),
            scheduler.clone(),
            Duration::from_millis(config.restore_announcements_ms),
        ));
        let actions = Arc::new(Actions::new(
            locator.clone(),
            self.speech,
            self.tones,
            clipboard,
            silencer.clone(),
            config.clone(),
        ));

        let context_menu = menu_opener(&actions, &self.ui, &scheduler);
        let rename = {
            let actions = actions.clone();
            let ui = self.ui.clone();
            Arc::new(move || menu::open_rename(&actions, &ui))
        };
        let handlers = GestureHandlers {
            say_size: action(&actions, Actions::say_size),
            compress: action(&actions, Actions::compress),
            copy_names: action(&actions, Actions::copy_names),
            copy_address: action(&actions, Actions::copy_address),
            copy_content: action(&actions, Actions::copy_content),
            invert_selection: action(&actions, Actions::invert_selection),
            context_menu: context_menu.clone(),
            rename,
        };
        let router = GestureRouter::new(
            self.accessibility,
            replay,
            scheduler,
            handlers,
            config.file_manager_app.clone(),
            Duration::from_millis(config.double_tap_window_ms),
        );

        crate::info!("[Engine] Assembled, watching {}", config.file_manager_app);
        Engine {
            locator,
            router,
            actions,
            ui: self.ui,
            silencer,
            context_menu,
            stopped: AtomicBool::new(false),
        }
    }
}

fn action(actions: &Arc<Actions>, run: fn(&Actions)) -> Arc<dyn Fn() + Send + Sync> {
    let actions = actions.clone();
    Arc::new(move || run(&actions))
}

/// Show the host menu; a chosen entry is dispatched through the
/// scheduler so it runs after the menu's own callback returns.
fn menu_opener(
    actions: &Arc<Actions>,
    ui: &Arc<dyn UiHost>,
    scheduler: &Arc<dyn Scheduler>,
) -> MenuOpener {
    let actions = actions.clone();
    let ui = ui.clone();
    let scheduler = scheduler.clone();
    Arc::new(move || {
        let actions = actions.clone();
        let ui_for_choice = ui.clone();
        let scheduler = scheduler.clone();
        ui.show_context_menu(
            menu::menu_entries(),
            Box::new(move |choice| {
                if let Some(item) = choice {
                    scheduler.call_later(
                        Duration::ZERO,
                        Box::new(move || menu::dispatch(item, &actions, &ui_for_choice)),
                    );
                }
            }),
        );
    })
}

/// The assembled extension core. One instance per host session.
pub struct Engine {
    locator: Arc<ExplorerLocator>,
    router: GestureRouter,
    actions: Arc<Actions>,
    ui: Arc<dyn UiHost>,
    silencer: Arc<Silencer>,
    context_menu: MenuOpener,
    stopped: AtomicBool,
}

impl Engine {
    pub fn builder(
        speech: Arc<dyn SpeechOutput>,
        tones: Arc<dyn ToneOutput>,
        accessibility: Arc<dyn AccessibilityQuery>,
        shell: Arc<dyn ShellWindows>,
        ui: Arc<dyn UiHost>,
    ) -> EngineBuilder {
        EngineBuilder {
            speech,
            tones,
            accessibility,
            shell,
            ui,
            clipboard: None,
            scheduler: None,
            replay: None,
            config: None,
        }
    }

    /// Route one gesture event from the host.
    pub fn handle_gesture(&self, gesture: &Gesture) {
        if self.stopped.load(Ordering::SeqCst) {
            crate::trace!("[Engine] Gesture after shutdown, ignored");
            return;
        }
        self.router.handle_gesture(gesture);
    }

    /// The accessibility focus moved; `None` when the handle is unknown.
    pub fn handle_focus_event(&self, handle: Option<WindowHandle>) {
        self.locator.note_focus_changed(handle);
    }

    /// The foreground window changed.
    pub fn handle_foreground_event(&self) {
        self.locator.note_foreground_changed();
    }

    /// Open the actions context menu through the host UI.
    pub fn open_context_menu(&self) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        (self.context_menu)();
    }

    /// Perform one menu action directly, without a rendered menu.
    pub fn dispatch_menu(&self, item: MenuItem) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        menu::dispatch(item, &self.actions, &self.ui);
    }

    /// Flag the host's speech layer consults before automatic
    /// announcements; raised while a silenced action's window is open.
    pub fn suppress_flag(&self) -> Arc<AtomicBool> {
        self.silencer.suppress_flag()
    }

    /// Drop armed tap timers, cancel and join running workers. Safe to
    /// call more than once; also runs on drop.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        crate::info!("[Engine] Shutting down");
        self.router.reset_taps();
        self.actions.shutdown();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
