// Selection size measurement.
//
// Sizes are summed on a background worker because a deep folder walk can
// take seconds on network shares. The worker polls a cancel flag between
// entries, beeps periodically while running, and hands its result to a
// completion callback unless it was superseded or shut down first.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::{fmt, fs, io};

use walkdir::WalkDir;

use crate::ops::feedback::{BeepCadence, ProgressBeeper};
use crate::speech::ToneOutput;

const SIZE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size: divide by 1024 until the value drops below it,
/// two decimals, largest supported unit is TB.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// What one measurement produced.
#[derive(Debug)]
pub enum SizeReport {
    /// Sum over all readable selected entries.
    Total(u64),
    /// The walk itself failed, distinct from "readable but empty".
    Failed(io::Error),
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeReport::Total(bytes) => write!(f, "{}", format_size(*bytes)),
            SizeReport::Failed(e) => write!(f, "measurement failed: {}", e),
        }
    }
}

/// Background worker measuring one selection.
pub struct SizeWorker {
    cancelled: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SizeWorker {
    /// Spawn the measurement thread. `on_done` runs on that thread after
    /// the walk finishes; it is skipped entirely when the worker was
    /// cancelled, so a superseded measurement never speaks.
    pub fn spawn(
        paths: Vec<PathBuf>,
        tones: Arc<dyn ToneOutput>,
        cadence: BeepCadence,
        on_done: Box<dyn FnOnce(SizeReport) + Send>,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_flag = cancelled.clone();

        let handle = thread::spawn(move || {
            let mut beeper = ProgressBeeper::start(tones, cadence);
            let report = match measure_paths(&paths, &cancel_flag) {
                Ok(total) => SizeReport::Total(total),
                Err(e) => SizeReport::Failed(e),
            };
            beeper.stop();

            if cancel_flag.load(Ordering::SeqCst) {
                crate::debug!("[SizeWorker] Cancelled, dropping result");
                return;
            }
            on_done(report);
        });

        Self {
            cancelled,
            thread_handle: Some(handle),
        }
    }

    /// Ask the walk to stop at the next entry boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.cancel();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                crate::warn!("[SizeWorker] Measurement thread panicked");
            }
        }
    }
}

impl Drop for SizeWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sum over all roots, stopping early when the flag is raised. A root
/// that cannot be read at all is skipped; only unexpected I/O failures
/// surface as an error.
fn measure_paths(paths: &[PathBuf], cancelled: &AtomicBool) -> io::Result<u64> {
    let mut total = 0u64;
    for path in paths {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        total = total.saturating_add(measure_root(path, cancelled)?);
    }
    Ok(total)
}

fn measure_root(path: &Path, cancelled: &AtomicBool) -> io::Result<u64> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ) =>
        {
            crate::debug!("[SizeWorker] Skipping unreadable {}: {}", path.display(), e);
            return Ok(0);
        }
        Err(e) => return Err(e),
    };

    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::debug!("[SizeWorker] Skipping walk entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            match entry.metadata() {
                Ok(metadata) => total = total.saturating_add(metadata.len()),
                Err(e) => {
                    crate::debug!(
                        "[SizeWorker] Skipping {}: {}",
                        entry.path().display(),
                        e
                    );
                }
            }
        }
    }
    Ok(total)
}
