// The operation hub. Every user-visible action lives here: its gating
// checks, the work itself, and the exact message spoken back. Each
// public method runs inside the silencer window so the host's automatic
// focus chatter stays quiet while file state changes underneath it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::MagpieConfig;
use crate::explorer::{ExplorerLocator, SelectedItem};
use crate::ops::archive;
use crate::ops::clipboard::ClipboardSink;
use crate::ops::create_file::{self, CreateFileRequest, CreatePolicy};
use crate::ops::feedback::BeepCadence;
use crate::ops::rename::{self, RenameError, RenameOutcome, RenameRequest, RenameTarget};
use crate::ops::size::{format_size, SizeReport, SizeWorker};
use crate::ops::transfer::{self, MirrorWorker, TransferMode, TransferStage};
use crate::ops::txt2folder::{self, Txt2FolderError};
use crate::speech::{Silencer, SpeechOutput, ToneOutput};

const NO_ITEMS_SELECTED: &str = "No items selected";
const NO_CURRENT_PATH: &str = "Unable to get current path";

/// All user-visible operations over the resolved file-manager state.
///
/// One instance per engine. Long-running work (size, mirror backup) goes
/// to a background worker; starting a new one supersedes the previous,
/// whose result is dropped instead of spoken.
pub struct Actions {
    locator: Arc<ExplorerLocator>,
    speech: Arc<dyn SpeechOutput>,
    tones: Arc<dyn ToneOutput>,
    clipboard: Arc<dyn ClipboardSink>,
    silencer: Arc<Silencer>,
    config: MagpieConfig,
    stage: Mutex<Option<TransferStage>>,
    size_worker: Mutex<Option<SizeWorker>>,
    mirror_worker: Mutex<Option<MirrorWorker>>,
}

impl Actions {
    pub fn new(
        locator: Arc<ExplorerLocator>,
        speech: Arc<dyn SpeechOutput>,
        tones: Arc<dyn ToneOutput>,
        clipboard: Arc<dyn ClipboardSink>,
        silencer: Arc<Silencer>,
        config: MagpieConfig,
    ) -> Self {
        Self {
            locator,
            speech,
            tones,
            clipboard,
            silencer,
            config,
            stage: Mutex::new(None),
            size_worker: Mutex::new(None),
            mirror_worker: Mutex::new(None),
        }
    }

    /// Sum the selection's size on a worker and speak the formatted total.
    pub fn say_size(&self) {
        self.silencer.run_silenced(|| {
            let items = match self.selected_paths() {
                Some(paths) => paths,
                None => return,
            };
            let count = items.len();
            let speech = self.speech.clone();
            let worker = SizeWorker::spawn(
                items,
                self.tones.clone(),
                self.cadence(),
                Box::new(move |report| match report {
                    SizeReport::Total(0) => speech.announce("No access to size data"),
                    SizeReport::Total(bytes) => {
                        let size = format_size(bytes);
                        if count > 1 {
                            speech.announce(&format!("{} items {}", count, size));
                        } else {
                            speech.announce(&size);
                        }
                    }
                    SizeReport::Failed(e) => {
                        crate::warn!("[Actions] Size measurement failed: {}", e);
                        speech.announce("Error calculating size");
                    }
                }),
            );
            self.replace_size_worker(worker);
        });
    }

    /// Gzip every selected regular file next to itself.
    pub fn compress(&self) {
        self.silencer.run_silenced(|| {
            let paths = match self.selected_paths() {
                Some(paths) => paths,
                None => return,
            };
            let summary = archive::compress_files(&paths);
            if summary.compressed == 0 && summary.failed > 0 {
                self.speech.announce("Error compressing files");
                return;
            }
            let mut message = format!("Compressed {} files", summary.compressed);
            if summary.skipped_folders > 0 {
                message.push_str(&format!(", {} folders skipped", summary.skipped_folders));
            }
            self.speech.announce(&message);
        });
    }

    /// Join the selected names with ", " onto the clipboard.
    pub fn copy_names(&self) {
        self.silencer.run_silenced(|| {
            let selection = match self.locator.resolve_selection() {
                Some(selection) if !selection.items.is_empty() => selection,
                _ => {
                    self.speech.announce(NO_ITEMS_SELECTED);
                    return;
                }
            };
            let joined = selection
                .items
                .iter()
                .map(|item| item.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            self.set_clipboard(&joined, &format!("Copied: {}", joined));
        });
    }

    /// Put the current folder path on the clipboard.
    pub fn copy_address(&self) {
        self.silencer.run_silenced(|| {
            let path = match self.locator.resolve_current_path() {
                Some(path) => path,
                None => {
                    self.speech.announce(NO_CURRENT_PATH);
                    return;
                }
            };
            let display = path.display().to_string();
            self.set_clipboard(&display, &format!("Copied: {}", display));
        });
    }

    /// Read one selected file (lossy UTF-8) onto the clipboard.
    pub fn copy_content(&self) {
        self.silencer.run_silenced(|| {
            let item = match self.single_selected_file() {
                Some(item) => item,
                None => return,
            };
            let bytes = match fs::read(&item.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    crate::warn!("[Actions] Failed to read {}: {}", item.path.display(), e);
                    self.speech.announce("Could not read file");
                    return;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            self.set_clipboard(&text, &format!("Copied content of {}", item.name));
        });
    }

    /// Flip the selection state of every item in the folder view.
    pub fn invert_selection(&self) {
        self.silencer.run_silenced(|| {
            let document = match self
                .locator
                .resolve_active_window()
                .and_then(|window| window.document())
            {
                Some(document) => document,
                None => {
                    self.speech.announce(NO_CURRENT_PATH);
                    return;
                }
            };

            let count = document.item_count().unwrap_or(0);
            let mut selected = 0;
            for index in 0..count {
                let currently = match document.is_item_selected(index) {
                    Some(state) => state,
                    None => {
                        crate::debug!("[Actions] Item {} vanished mid-inversion, stopping", index);
                        break;
                    }
                };
                if document.set_item_selected(index, !currently) {
                    if !currently {
                        selected += 1;
                    }
                } else {
                    crate::debug!("[Actions] Could not toggle item {}", index);
                    if currently {
                        selected += 1;
                    }
                }
            }
            self.speech.announce(&format!("{} items selected", selected));
        });
    }

    /// Validate the selection for a rename and return the dialog prefill.
    pub fn rename_prefill(&self) -> Option<RenameTarget> {
        self.silencer.run_silenced(|| {
            let item = self.single_selected_file()?;
            Some(RenameTarget::for_file(&item.path))
        })
    }

    /// Apply a submitted rename and speak the outcome.
    pub fn apply_rename(&self, target: &Path, request: &RenameRequest) {
        self.silencer.run_silenced(|| {
            match rename::perform(target, request) {
                Ok(RenameOutcome::Unchanged) => self.speech.announce("File name not changed"),
                Ok(RenameOutcome::Renamed(name)) => {
                    self.speech.announce(&format!("File renamed to {}", name));
                }
                Err(RenameError::EmptyName) => {
                    self.speech.announce("File name cannot be empty");
                }
                Err(RenameError::AlreadyExists) => {
                    self.speech.announce("A file with this name already exists");
                }
                Err(RenameError::Io(e)) => {
                    crate::warn!("[Actions] Rename of {} failed: {}", target.display(), e);
                    self.speech.announce("Error renaming file");
                }
            };
        });
    }

    /// Stage the current selection for a later paste as a copy.
    pub fn stage_copy(&self) {
        self.stage_transfer(TransferMode::Copy);
    }

    /// Stage the current selection for a later paste as a move.
    pub fn stage_move(&self) {
        self.stage_transfer(TransferMode::Move);
    }

    fn stage_transfer(&self, mode: TransferMode) {
        self.silencer.run_silenced(|| {
            let items = match self.selected_paths() {
                Some(paths) => paths,
                None => return,
            };
            let count = items.len();
            *self.stage.lock() = Some(TransferStage { mode, items });
            self.speech
                .announce(&format!("{} items staged for {}", count, mode.label()));
        });
    }

    /// Paste the staged selection into the current folder. A stage is
    /// consumed by its paste.
    pub fn paste(&self) {
        self.silencer.run_silenced(|| {
            let stage = match self.stage.lock().take() {
                Some(stage) => stage,
                None => {
                    self.speech.announce("Nothing staged");
                    return;
                }
            };
            let destination = match self.locator.resolve_current_path() {
                Some(path) => path,
                None => {
                    self.speech.announce(NO_CURRENT_PATH);
                    return;
                }
            };
            let pasted = transfer::paste(&stage, &destination);
            self.speech.announce(&format!("{} items pasted", pasted));
        });
    }

    /// Mirror the current folder into the configured backup destination
    /// on a worker.
    pub fn mirror_backup(&self) {
        self.silencer.run_silenced(|| {
            let backup_root = match &self.config.mirror_backup_dir {
                Some(dir) => dir.clone(),
                None => {
                    self.speech.announce("No backup destination configured");
                    return;
                }
            };
            let source = match self.locator.resolve_current_path() {
                Some(path) => path,
                None => {
                    self.speech.announce(NO_CURRENT_PATH);
                    return;
                }
            };

            let speech = self.speech.clone();
            let worker = MirrorWorker::spawn(
                source,
                backup_root,
                self.tones.clone(),
                self.cadence(),
                Box::new(move |result| match result {
                    Ok(summary) => {
                        speech.announce(&format!(
                            "Mirrored {} files, removed {}",
                            summary.copied, summary.removed
                        ));
                    }
                    Err(e) => {
                        crate::warn!("[Actions] Mirror backup failed: {}", e);
                        speech.announce("Error during backup");
                    }
                }),
            );
            self.replace_mirror_worker(worker);
        });
    }

    /// Expand the selected .txt file into folders, one per line.
    pub fn txt_to_folder(&self) {
        self.silencer.run_silenced(|| {
            let item = match self.single_txt_selection() {
                Some(item) => item,
                None => return,
            };
            match txt2folder::expand(&item.path) {
                Ok(report) => {
                    let base = report
                        .base_folder
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| report.base_folder.display().to_string());
                    self.speech
                        .announce(&format!("Created {} folders in {}", report.created, base));
                }
                Err(Txt2FolderError::Unreadable(e)) => {
                    crate::warn!("[Actions] Failed to read {}: {}", item.path.display(), e);
                    self.speech.announce("Could not read file");
                }
                Err(Txt2FolderError::NoNames) => {
                    self.speech.announce("No valid folder names found");
                }
                Err(e) => {
                    crate::warn!("[Actions] Folder expansion failed: {}", e);
                    self.speech.announce("Error creating folders");
                }
            }
        });
    }

    /// Resolve the directory for a create-file dialog and its prefill.
    pub fn create_file_prefill(&self) -> Option<(PathBuf, CreateFileRequest)> {
        self.silencer.run_silenced(|| {
            let directory = match self.locator.resolve_current_path() {
                Some(path) => path,
                None => {
                    self.speech.announce(NO_CURRENT_PATH);
                    return None;
                }
            };
            Some((
                directory,
                CreateFileRequest {
                    stem: String::new(),
                    extension: self.config.default_file_extension.clone(),
                    count: 1,
                },
            ))
        })
    }

    /// Apply a submitted create-file request and speak the outcome.
    pub fn apply_create_files(&self, directory: &Path, request: &CreateFileRequest) {
        self.silencer.run_silenced(|| {
            let policy = CreatePolicy {
                default_stem: self.config.default_file_stem.clone(),
                default_extension: self.config.default_file_extension.clone(),
                max_count: self.config.max_create_count,
            };
            match create_file::create_files(directory, request, &policy) {
                Ok(report) => {
                    if report.used_default_name {
                        self.speech.announce("Some files will use default names");
                    }
                    match report.created {
                        0 => self.speech.announce("No files were created"),
                        1 => self.speech.announce("1 file created"),
                        n => self.speech.announce(&format!("{} files created", n)),
                    }
                }
                Err(e) => self.speech.announce(&e.to_string()),
            }
        });
    }

    /// Ask running workers to stop; does not wait for them.
    pub fn cancel_workers(&self) {
        if let Some(worker) = self.size_worker.lock().as_ref() {
            worker.cancel();
        }
        if let Some(worker) = self.mirror_worker.lock().as_ref() {
            worker.cancel();
        }
    }

    /// Cancel and join all workers. Idempotent.
    pub fn shutdown(&self) {
        if let Some(mut worker) = self.size_worker.lock().take() {
            worker.stop();
        }
        if let Some(mut worker) = self.mirror_worker.lock().take() {
            worker.stop();
        }
    }

    fn cadence(&self) -> BeepCadence {
        BeepCadence {
            interval: Duration::from_millis(self.config.progress_beep_interval_ms),
            freq_hz: self.config.progress_beep_freq_hz,
            duration_ms: self.config.progress_beep_duration_ms,
        }
    }

    fn set_clipboard(&self, text: &str, success: &str) {
        match self.clipboard.set_text(text) {
            Ok(()) => self.speech.announce(success),
            Err(e) => {
                crate::warn!("[Actions] Clipboard write failed: {}", e);
                self.speech.announce("Could not open clipboard");
            }
        }
    }

    /// Selected paths, or None (announced) when nothing is selected or
    /// no window resolves at all.
    fn selected_paths(&self) -> Option<Vec<PathBuf>> {
        let items = match self.locator.resolve_selection() {
            Some(selection) => selection.items,
            None => Vec::new(),
        };
        if items.is_empty() {
            self.speech.announce(NO_ITEMS_SELECTED);
            return None;
        }
        Some(items.into_iter().map(|item| item.path).collect())
    }

    /// Exactly one selected regular file, with the rename-style gating
    /// messages spoken for every other shape of selection.
    fn single_selected_file(&self) -> Option<SelectedItem> {
        let mut items = match self.locator.resolve_selection() {
            Some(selection) => selection.items,
            None => {
                self.speech.announce(NO_ITEMS_SELECTED);
                return None;
            }
        };
        match items.len() {
            0 => {
                self.speech.announce(NO_ITEMS_SELECTED);
                None
            }
            1 => {
                if items[0].path.is_dir() {
                    self.speech.announce("Please select a file, not a folder");
                    return None;
                }
                items.pop()
            }
            _ => {
                self.speech.announce("Please select only one file");
                None
            }
        }
    }

    fn single_txt_selection(&self) -> Option<SelectedItem> {
        let mut items = match self.locator.resolve_selection() {
            Some(selection) => selection.items,
            None => Vec::new(),
        };
        let valid = items.len() == 1
            && items[0].path.is_file()
            && items[0]
                .path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("txt"))
                .unwrap_or(false);
        if !valid {
            self.speech.announce("Please select one .txt file");
            return None;
        }
        items.pop()
    }

    fn replace_size_worker(&self, worker: SizeWorker) {
        let mut slot = self.size_worker.lock();
        if let Some(mut previous) = slot.take() {
            crate::debug!("[Actions] Superseding a running size measurement");
            previous.stop();
        }
        *slot = Some(worker);
    }

    fn replace_mirror_worker(&self, worker: MirrorWorker) {
        let mut slot = self.mirror_worker.lock();
        if let Some(mut previous) = slot.take() {
            crate::debug!("[Actions] Superseding a running mirror backup");
            previous.stop();
        }
        *slot = Some(worker);
    }
}

#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;
