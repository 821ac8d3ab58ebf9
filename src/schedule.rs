// Deferred-call scheduling.
//
// The host screen reader normally supplies its own scheduler so callbacks
// land on its UI thread; ThreadScheduler is the standalone fallback used
// by tests and headless hosts. Timers must be cancellable because the
// debounce state machine arms and disarms them constantly.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Cancellation handle for a scheduled callback.
///
/// Cancelling is idempotent and best-effort: a callback that has already
/// started running cannot be recalled.
#[derive(Clone)]
pub struct TaskHandle {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Cancel the scheduled callback if it has not started yet.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.state;
        let mut cancelled = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *cancelled = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.state;
        *lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait out the delay; returns false if cancelled before it elapsed.
    fn sleep_until(&self, deadline: Instant) -> bool {
        let (lock, cvar) = &*self.state;
        let mut cancelled = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            if *cancelled {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _timeout) = cvar
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            cancelled = guard;
        }
    }
}

/// Deferred-call scheduler consumed by the debounce timers, the
/// announcement-restore delay, and asynchronous menu dispatch.
///
/// Implementations must be callable from any thread and must run the
/// callback at most once, never before the delay elapses.
pub trait Scheduler: Send + Sync {
    fn call_later(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TaskHandle;
}

/// Thread-per-timer scheduler. Each callback gets a short-lived thread
/// that waits on a condvar so cancellation wakes it immediately instead
/// of letting it run out the clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for ThreadScheduler {
    fn call_later(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TaskHandle {
        let handle = TaskHandle::new();
        let waiter = handle.clone();
        let deadline = Instant::now() + delay;
        thread::spawn(move || {
            if waiter.sleep_until(deadline) {
                callback();
            }
        });
        handle
    }
}
