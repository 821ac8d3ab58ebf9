// Periodic "still working" beeps for slow operations.
//
// A fast operation finishes before the first interval elapses and the
// user hears nothing. The worker stops the beeper when it completes,
// and the sliced sleep bounds how long a stop can lag behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::speech::ToneOutput;

/// Granularity of the stop-flag poll while waiting out an interval.
const POLL_SLICE_MS: u64 = 50;

/// Beep cadence settings, sourced from the user configuration.
#[derive(Debug, Clone, Copy)]
pub struct BeepCadence {
    pub interval: Duration,
    pub freq_hz: u32,
    pub duration_ms: u32,
}

impl Default for BeepCadence {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            freq_hz: 440,
            duration_ms: 100,
        }
    }
}

/// Background beeper that ticks until stopped.
pub struct ProgressBeeper {
    stopped: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ProgressBeeper {
    /// Spawn the beeper thread. The first beep comes one full interval
    /// after the start, so operations that finish quickly stay silent.
    pub fn start(tones: Arc<dyn ToneOutput>, cadence: BeepCadence) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let stop_flag = stopped.clone();

        let handle = thread::spawn(move || {
            loop {
                if wait_or_stop(&stop_flag, cadence.interval) {
                    break;
                }
                tones.beep(cadence.freq_hz, cadence.duration_ms);
            }
        });

        Self {
            stopped,
            thread_handle: Some(handle),
        }
    }

    /// Stop beeping and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                crate::warn!("[ProgressBeeper] Beep thread panicked");
            }
        }
    }
}

impl Drop for ProgressBeeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleep for `interval` in short slices, returning true as soon as the
/// stop flag is raised.
fn wait_or_stop(stopped: &AtomicBool, interval: Duration) -> bool {
    let slice = Duration::from_millis(POLL_SLICE_MS);
    let mut remaining = interval;
    while !remaining.is_zero() {
        if stopped.load(Ordering::SeqCst) {
            return true;
        }
        let step = remaining.min(slice);
        thread::sleep(step);
        remaining -= step;
    }
    stopped.load(Ordering::SeqCst)
}
