// Rename of a single selected file.
//
// The host collects the new name through its own dialog; this module
// owns the validation and the filesystem step so both the gesture and
// the menu path behave identically.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenameError {
    #[error("File name cannot be empty")]
    EmptyName,
    #[error("A file with this name already exists")]
    AlreadyExists,
    #[error("Rename failed: {0}")]
    Io(String),
}

/// Prefill for the host's rename dialog: the stem and extension are
/// edited separately, the extension without its dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTarget {
    pub path: PathBuf,
    pub stem: String,
    pub extension: String,
}

impl RenameTarget {
    pub fn for_file(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            stem,
            extension,
        }
    }
}

/// New name as entered in the dialog, extension without its dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    pub stem: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The entered name equals the current one; nothing was touched.
    Unchanged,
    /// Renamed; carries the new file name.
    Renamed(String),
}

/// Validate the request and rename the file. Existing targets are never
/// clobbered.
pub fn perform(path: &Path, request: &RenameRequest) -> Result<RenameOutcome, RenameError> {
    let stem = request.stem.trim();
    let extension = request.extension.trim();
    if stem.is_empty() {
        return Err(RenameError::EmptyName);
    }

    let new_name = if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    };

    let new_path = match path.parent() {
        Some(parent) => parent.join(&new_name),
        None => PathBuf::from(&new_name),
    };

    if new_path == path {
        return Ok(RenameOutcome::Unchanged);
    }
    if new_path.exists() {
        return Err(RenameError::AlreadyExists);
    }

    fs::rename(path, &new_path).map_err(|e| RenameError::Io(e.to_string()))?;
    crate::info!(
        "[Rename] {} -> {}",
        path.display(),
        new_path.display()
    );
    Ok(RenameOutcome::Renamed(new_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(stem: &str, extension: &str) -> RenameRequest {
        RenameRequest {
            stem: stem.to_string(),
            extension: extension.to_string(),
        }
    }

    #[test]
    fn target_prefill_splits_stem_and_extension() {
        let target = RenameTarget::for_file(Path::new("/tmp/report.final.txt"));
        assert_eq!(target.stem, "report.final");
        assert_eq!(target.extension, "txt");

        let bare = RenameTarget::for_file(Path::new("/tmp/README"));
        assert_eq!(bare.stem, "README");
        assert_eq!(bare.extension, "");
    }

    #[test]
    fn renames_a_file_and_reports_the_new_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.txt");
        fs::write(&path, "content").unwrap();

        let outcome = perform(&path, &request("new", "md")).unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed("new.md".to_string()));
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(dir.path().join("new.md")).unwrap(), "content");
    }

    #[test]
    fn empty_stem_is_rejected_before_touching_the_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        fs::write(&path, "").unwrap();

        assert_eq!(perform(&path, &request("  ", "txt")), Err(RenameError::EmptyName));
        assert!(path.exists());
    }

    #[test]
    fn unchanged_name_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("same.txt");
        fs::write(&path, "").unwrap();

        assert_eq!(
            perform(&path, &request("same", "txt")),
            Ok(RenameOutcome::Unchanged)
        );
        assert!(path.exists());
    }

    #[test]
    fn an_existing_target_is_never_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        assert_eq!(
            perform(&path, &request("b", "txt")),
            Err(RenameError::AlreadyExists)
        );
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "b");
    }

    #[test]
    fn extension_can_be_dropped_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "").unwrap();

        let outcome = perform(&path, &request("notes", "")).unwrap();
        assert_eq!(outcome, RenameOutcome::Renamed("notes".to_string()));
        assert!(dir.path().join("notes").exists());
    }
}
