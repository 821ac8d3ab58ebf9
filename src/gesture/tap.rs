// Single- versus double-tap disambiguation.
//
// One instance per gesture identity. A first tap arms a cancellable
// timer; a second tap inside the window cancels it and dispatches the
// double action immediately; the timer firing dispatches the single
// action. Further taps inside the same burst are absorbed so a burst of
// any length produces exactly one double dispatch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::schedule::{Scheduler, TaskHandle};

/// Default debounce window separating single from double taps (300ms)
pub const DEFAULT_TAP_WINDOW_MS: u64 = 300;

type TapAction = Arc<dyn Fn() + Send + Sync>;

struct TapState {
    /// Taps seen in the current sequence; 0 means idle
    tap_count: u32,
    /// Time of the last tap in the current sequence
    last_tap: Option<Instant>,
    /// Armed only while tap_count == 1 and the window has not elapsed
    timer: Option<TaskHandle>,
    /// Bumped on every reset and resolve so a timer callback that
    /// outlived its sequence can recognize itself and do nothing
    seq: u64,
}

/// Debounce state machine for one gesture identity.
pub struct TapDisambiguator {
    state: Arc<Mutex<TapState>>,
    window: Duration,
    scheduler: Arc<dyn Scheduler>,
    single: TapAction,
    double: TapAction,
}

impl TapDisambiguator {
    pub fn new(
        window: Duration,
        scheduler: Arc<dyn Scheduler>,
        single: impl Fn() + Send + Sync + 'static,
        double: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TapState {
                tap_count: 0,
                last_tap: None,
                timer: None,
                seq: 0,
            })),
            window,
            scheduler,
            single: Arc::new(single),
            double: Arc::new(double),
        }
    }

    /// Record one tap. Returns true when this tap dispatched the double
    /// action; the single action, if due, fires later from the timer.
    pub fn register_tap(&self) -> bool {
        let now = Instant::now();
        let dispatch = {
            let mut state = self.state.lock();

            // A tap later than the window after the previous one starts a
            // new sequence no matter what the counter says; cancelling the
            // stale timer and bumping seq defuses a racing callback.
            if let Some(last) = state.last_tap {
                if now.duration_since(last) > self.window && state.tap_count != 0 {
                    if let Some(timer) = state.timer.take() {
                        timer.cancel();
                    }
                    state.tap_count = 0;
                    state.seq = state.seq.wrapping_add(1);
                }
            }

            state.tap_count += 1;
            state.last_tap = Some(now);

            match state.tap_count {
                1 => {
                    let seq = state.seq;
                    let shared = self.state.clone();
                    let single = self.single.clone();
                    state.timer = Some(self.scheduler.call_later(
                        self.window,
                        Box::new(move || Self::resolve_timeout(&shared, seq, &single)),
                    ));
                    None
                }
                2 => {
                    if let Some(timer) = state.timer.take() {
                        timer.cancel();
                    }
                    Some(self.double.clone())
                }
                // Burst continues past the double dispatch: absorb.
                _ => None,
            }
        };

        match dispatch {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Abort any pending sequence without dispatching.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        state.tap_count = 0;
        state.last_tap = None;
        state.seq = state.seq.wrapping_add(1);
    }

    /// Timer path. Dispatches the single action only if the sequence it
    /// was armed for is still the current one and still pending; a
    /// concurrent double dispatch or forced reset makes this a no-op.
    fn resolve_timeout(state: &Arc<Mutex<TapState>>, seq: u64, single: &TapAction) {
        let fire = {
            let mut state = state.lock();
            if state.seq != seq || state.tap_count != 1 {
                false
            } else {
                state.tap_count = 0;
                state.timer = None;
                state.seq = state.seq.wrapping_add(1);
                true
            }
        };
        if fire {
            single();
        }
    }

    #[cfg(test)]
    pub fn window_ms(&self) -> u64 {
        self.window.as_millis() as u64
    }
}
