// Empty-file creation in the current directory. Template contents are
// deliberately out of scope, every file starts blank.

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFileRequest {
    pub stem: String,
    pub extension: String,
    pub count: usize,
}

/// Defaults and limits, filled in from the config by the caller.
#[derive(Debug, Clone)]
pub struct CreatePolicy {
    pub default_stem: String,
    pub default_extension: String,
    pub max_count: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreateFileError {
    #[error("Number of files must be between 1 and {0}")]
    CountOutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateReport {
    pub created: usize,
    pub used_default_name: bool,
}

/// Create `request.count` empty files in `directory`. One file keeps the
/// bare stem, several are numbered `{stem}_{i}.{ext}` from 1. Taken names
/// probe `_1` through `_100` before that file is given up on.
pub fn create_files(
    directory: &Path,
    request: &CreateFileRequest,
    policy: &CreatePolicy,
) -> Result<CreateReport, CreateFileError> {
    if request.count < 1 || request.count > policy.max_count {
        return Err(CreateFileError::CountOutOfRange(policy.max_count));
    }

    let mut used_default_name = false;
    let stem = {
        let trimmed = request.stem.trim();
        if trimmed.is_empty() {
            used_default_name = true;
            policy.default_stem.clone()
        } else {
            trimmed.to_string()
        }
    };
    let extension = {
        let trimmed = request.extension.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            policy.default_extension.clone()
        } else {
            trimmed.to_string()
        }
    };

    let mut created = 0;
    for i in 1..=request.count {
        let file_stem = if request.count == 1 {
            stem.clone()
        } else {
            format!("{}_{}", stem, i)
        };
        let target = match free_target(directory, &file_stem, &extension) {
            Some(target) => target,
            None => {
                crate::warn!("[CreateFile] No free name for {:?}, skipped", file_stem);
                continue;
            }
        };
        match fs::write(&target, b"") {
            Ok(()) => created += 1,
            Err(e) => {
                crate::warn!("[CreateFile] Failed to create {}: {}", target.display(), e);
            }
        }
    }

    crate::info!(
        "[CreateFile] Created {} files in {}",
        created,
        directory.display()
    );
    Ok(CreateReport {
        created,
        used_default_name,
    })
}

fn free_target(directory: &Path, stem: &str, extension: &str) -> Option<PathBuf> {
    let direct = directory.join(format!("{}.{}", stem, extension));
    if !direct.exists() {
        return Some(direct);
    }
    for n in 1..=100 {
        let candidate = directory.join(format!("{}_{}.{}", stem, n, extension));
        if !candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
