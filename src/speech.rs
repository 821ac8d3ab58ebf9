// Speech and tone output seams, plus the silencing window that keeps the
// host screen reader from chattering about focus churn while an automated
// file operation runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::schedule::Scheduler;

/// Speech side of the host screen reader.
///
/// Implementations must be callable from any thread; workers report
/// results through this trait without touching engine state.
pub trait SpeechOutput: Send + Sync {
    /// Queue a message for speaking.
    fn announce(&self, message: &str);
    /// Drop everything queued and stop the current utterance.
    fn cancel_speech(&self);
}

/// Tone side of the host, used for periodic "still working" feedback.
pub trait ToneOutput: Send + Sync {
    fn beep(&self, freq_hz: u32, duration_ms: u32);
}

/// Runs an action inside a suppression window: the speech queue is
/// cancelled, the shared suppress flag is raised so the host withholds
/// its automatic announcements, and a deferred task lowers the flag
/// after the restore delay. The action's own result message is spoken
/// explicitly and is not affected by the flag.
pub struct Silencer {
    speech: Arc<dyn SpeechOutput>,
    scheduler: Arc<dyn Scheduler>,
    suppressed: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
    restore_delay: Duration,
}

impl Silencer {
    pub fn new(
        speech: Arc<dyn SpeechOutput>,
        scheduler: Arc<dyn Scheduler>,
        restore_delay: Duration,
    ) -> Self {
        Self {
            speech,
            scheduler,
            suppressed: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            restore_delay,
        }
    }

    /// Shared flag the host's speech layer consults before speaking
    /// automatic focus/selection announcements.
    pub fn suppress_flag(&self) -> Arc<AtomicBool> {
        self.suppressed.clone()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Cancel queued speech, raise the flag, run the action, then lower
    /// the flag after the restore delay. Overlapping runs extend the
    /// window: a restore scheduled by an earlier run no-ops once a newer
    /// run has bumped the epoch.
    pub fn run_silenced<R>(&self, action: impl FnOnce() -> R) -> R {
        self.speech.cancel_speech();
        self.suppressed.store(true, Ordering::SeqCst);
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let result = action();

        let suppressed = self.suppressed.clone();
        let epoch = self.epoch.clone();
        self.scheduler.call_later(
            self.restore_delay,
            Box::new(move || {
                if epoch.load(Ordering::SeqCst) == my_epoch {
                    suppressed.store(false, Ordering::SeqCst);
                }
            }),
        );
        result
    }
}
