// Staged transfers (the robocopy submenu) and dated mirror backups.
//
// Copy/move stage the current selection; paste lands it in the folder
// open at paste time. Mirroring copies new and updated files into a
// per-day backup folder and prunes entries the source no longer has.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::{fs, io};

use walkdir::WalkDir;

use crate::ops::feedback::{BeepCadence, ProgressBeeper};
use crate::speech::ToneOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn label(self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

/// Selection staged by the robocopy submenu, waiting for a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStage {
    pub mode: TransferMode,
    pub items: Vec<PathBuf>,
}

/// Paste a stage into `destination`. Returns how many items arrived;
/// per-item failures are logged and skipped.
pub fn paste(stage: &TransferStage, destination: &Path) -> usize {
    let mut pasted = 0;
    for source in &stage.items {
        let name = match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                crate::warn!("[Transfer] {} has no file name, skipped", source.display());
                continue;
            }
        };
        let target = match unique_target(destination, &name) {
            Ok(target) => target,
            Err(e) => {
                crate::warn!("[Transfer] No free target name for {}: {}", name, e);
                continue;
            }
        };
        let result = match stage.mode {
            TransferMode::Copy => copy_entry(source, &target),
            TransferMode::Move => move_entry(source, &target),
        };
        match result {
            Ok(()) => pasted += 1,
            Err(e) => {
                crate::warn!(
                    "[Transfer] Failed to {} {}: {}",
                    stage.mode.label(),
                    source.display(),
                    e
                );
            }
        }
    }
    pasted
}

/// First free name in `destination`: "report.txt", then "report (2).txt",
/// "report (3).txt", and so on.
fn unique_target(destination: &Path, name: &str) -> io::Result<PathBuf> {
    let direct = destination.join(name);
    if !direct.exists() {
        return Ok(direct);
    }
    let (stem, extension) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };
    for n in 2..1000 {
        let candidate = destination.join(format!("{} ({}){}", stem, n, extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free target name",
    ))
}

fn copy_entry(source: &Path, target: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(source)?;
    if !metadata.is_dir() {
        fs::copy(source, target)?;
        return Ok(());
    }
    copy_tree(source, target)
}

/// Copy a folder tree, continuing past unreadable entries. The first
/// failure is reported after the rest of the tree has been attempted.
fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    let mut first_error: Option<io::Error> = None;
    for entry in WalkDir::new(source) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::warn!("[Transfer] Skipping walk entry: {}", e);
                if first_error.is_none() {
                    first_error = Some(io::Error::from(e));
                }
                continue;
            }
        };
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let dest = target.join(relative);
        let step = if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
        } else {
            match dest.parent() {
                Some(parent) => fs::create_dir_all(parent)
                    .and_then(|_| fs::copy(entry.path(), &dest).map(|_| ())),
                None => fs::copy(entry.path(), &dest).map(|_| ()),
            }
        };
        if let Err(e) = step {
            crate::warn!("[Transfer] Failed to copy {}: {}", entry.path().display(), e);
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn move_entry(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // Rename cannot cross volumes; fall back to copy then delete.
            crate::debug!(
                "[Transfer] Rename failed ({}), copying instead",
                rename_err
            );
            copy_entry(source, target)?;
            if source.is_dir() {
                fs::remove_dir_all(source)
            } else {
                fs::remove_file(source)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub copied: usize,
    pub removed: usize,
}

/// Today's backup folder name for `source`, e.g. "Projects_2026-08-21".
pub fn backup_folder_name(source: &Path) -> Option<String> {
    let name = source.file_name()?.to_string_lossy().into_owned();
    Some(format!("{}_{}", name, chrono::Local::now().format("%Y-%m-%d")))
}

/// Mirror `source` into `backup_root/{name}_{date}`. New files and files
/// whose size changed or whose source is newer are copied; entries absent
/// from the source are removed from the backup.
pub fn mirror_folder(
    source: &Path,
    backup_root: &Path,
    cancelled: &AtomicBool,
) -> io::Result<MirrorSummary> {
    let folder = backup_folder_name(source).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "source has no folder name")
    })?;
    let target = backup_root.join(folder);
    fs::create_dir_all(&target)?;

    let mut summary = MirrorSummary::default();

    for entry in WalkDir::new(source) {
        if cancelled.load(Ordering::SeqCst) {
            return Ok(summary);
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::warn!("[Mirror] Skipping walk entry: {}", e);
                continue;
            }
        };
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&dest) {
                crate::warn!("[Mirror] Failed to create {}: {}", dest.display(), e);
            }
            continue;
        }
        if !needs_copy(entry.path(), &dest) {
            continue;
        }
        let step = match dest.parent() {
            Some(parent) => fs::create_dir_all(parent)
                .and_then(|_| fs::copy(entry.path(), &dest).map(|_| ())),
            None => fs::copy(entry.path(), &dest).map(|_| ()),
        };
        match step {
            Ok(()) => summary.copied += 1,
            Err(e) => {
                crate::warn!("[Mirror] Failed to copy {}: {}", entry.path().display(), e);
            }
        }
    }

    // Prune pass: anything in the backup with no counterpart in the
    // source goes away. Collect first so removal does not fight the walk.
    let mut absent: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(&target) {
        if cancelled.load(Ordering::SeqCst) {
            return Ok(summary);
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::warn!("[Mirror] Skipping prune entry: {}", e);
                continue;
            }
        };
        let relative = match entry.path().strip_prefix(&target) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        if !source.join(relative).exists() {
            absent.push(entry.path().to_path_buf());
        }
    }
    for path in absent {
        // A parent that was already pruned takes its children with it.
        if !path.exists() {
            continue;
        }
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => summary.removed += 1,
            Err(e) => {
                crate::warn!("[Mirror] Failed to remove {}: {}", path.display(), e);
            }
        }
    }

    Ok(summary)
}

/// A file needs copying when the backup lacks it, the sizes differ, or
/// the source was modified after the backup copy was written.
fn needs_copy(source: &Path, dest: &Path) -> bool {
    let source_meta = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(_) => return false,
    };
    let dest_meta = match fs::metadata(dest) {
        Ok(metadata) => metadata,
        Err(_) => return true,
    };
    if source_meta.len() != dest_meta.len() {
        return true;
    }
    match (source_meta.modified(), dest_meta.modified()) {
        (Ok(source_time), Ok(dest_time)) => dest_time < source_time,
        _ => true,
    }
}

/// Background worker running one mirror backup.
pub struct MirrorWorker {
    cancelled: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MirrorWorker {
    /// Spawn the mirror thread. `on_done` is skipped when the worker was
    /// cancelled, so an aborted backup never announces a result.
    pub fn spawn(
        source: PathBuf,
        backup_root: PathBuf,
        tones: Arc<dyn ToneOutput>,
        cadence: BeepCadence,
        on_done: Box<dyn FnOnce(io::Result<MirrorSummary>) + Send>,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_flag = cancelled.clone();

        let handle = thread::spawn(move || {
            let mut beeper = ProgressBeeper::start(tones, cadence);
            let result = mirror_folder(&source, &backup_root, &cancel_flag);
            beeper.stop();

            if cancel_flag.load(Ordering::SeqCst) {
                crate::debug!("[Mirror] Cancelled, dropping result");
                return;
            }
            on_done(result);
        });

        Self {
            cancelled,
            thread_handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        self.cancel();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                crate::warn!("[Mirror] Backup thread panicked");
            }
        }
    }
}

impl Drop for MirrorWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;
