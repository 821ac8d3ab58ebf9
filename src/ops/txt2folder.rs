// TXT-to-folder expansion: every non-empty line of a selected .txt file
// becomes a folder inside a base folder named after the file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

/// Windows caps path components at 255 characters.
const MAX_NAME_CHARS: usize = 255;

/// Names Windows refuses as path components no matter the extension.
const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Txt2FolderError {
    #[error("Could not read file: {0}")]
    Unreadable(String),
    #[error("No valid folder names found")]
    NoNames,
    #[error("Failed to create base folder: {0}")]
    BaseFolder(String),
    #[error("Pattern error: {0}")]
    Pattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionReport {
    pub base_folder: PathBuf,
    pub created: usize,
}

struct LineSanitizer {
    forbidden: Regex,
    whitespace: Regex,
}

impl LineSanitizer {
    fn new() -> Result<Self, Txt2FolderError> {
        // Tab is left out so the whitespace pass turns it into a space
        // instead of gluing the words together.
        let forbidden = Regex::new(r#"[\x00-\x08\x0b-\x1f<>:"/\\|?*]"#)
            .map_err(|e| Txt2FolderError::Pattern(e.to_string()))?;
        let whitespace =
            Regex::new(r"\s+").map_err(|e| Txt2FolderError::Pattern(e.to_string()))?;
        Ok(Self {
            forbidden,
            whitespace,
        })
    }

    /// One line to one folder name, or None when nothing usable is left.
    fn sanitize(&self, line: &str) -> Option<String> {
        let stripped = self.forbidden.replace_all(line, "");
        let collapsed = self.whitespace.replace_all(&stripped, " ");
        let trimmed = collapsed
            .trim()
            .trim_end_matches(|c| c == '.' || c == ' ');
        if trimmed.is_empty() {
            return None;
        }

        let mut name = if RESERVED_NAMES.contains(&trimmed.to_ascii_uppercase().as_str()) {
            format!("{}_folder", trimmed)
        } else {
            trimmed.to_string()
        };
        if name.chars().count() > MAX_NAME_CHARS {
            name = name.chars().take(MAX_NAME_CHARS).collect();
        }
        Some(name)
    }
}

/// Expand `txt_path` into folders. The base folder is created next to
/// the file, named after its stem (`name_2`, `name_3`, ... when taken).
pub fn expand(txt_path: &Path) -> Result<ExpansionReport, Txt2FolderError> {
    let sanitizer = LineSanitizer::new()?;

    let bytes =
        fs::read(txt_path).map_err(|e| Txt2FolderError::Unreadable(e.to_string()))?;
    let contents = String::from_utf8_lossy(&bytes);

    let names: Vec<String> = contents
        .lines()
        .filter_map(|line| sanitizer.sanitize(line))
        .collect();
    if names.is_empty() {
        return Err(Txt2FolderError::NoNames);
    }

    let base_folder = free_base_folder(txt_path)?;
    fs::create_dir(&base_folder).map_err(|e| Txt2FolderError::BaseFolder(e.to_string()))?;

    let mut used: HashSet<String> = HashSet::new();
    let mut created = 0;
    for name in names {
        let unique = match deduplicate(&name, &used) {
            Some(unique) => unique,
            None => {
                crate::warn!("[Txt2Folder] No free name for line {:?}, skipped", name);
                continue;
            }
        };
        match fs::create_dir(base_folder.join(&unique)) {
            Ok(()) => {
                used.insert(unique.to_ascii_lowercase());
                created += 1;
            }
            Err(e) => {
                crate::warn!("[Txt2Folder] Failed to create {:?}: {}", unique, e);
            }
        }
    }

    crate::info!(
        "[Txt2Folder] Created {} folders in {}",
        created,
        base_folder.display()
    );
    Ok(ExpansionReport {
        base_folder,
        created,
    })
}

/// Base folder path next to the file, stem dedup'd with `_2`, `_3`, ...
fn free_base_folder(txt_path: &Path) -> Result<PathBuf, Txt2FolderError> {
    let stem = txt_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Txt2FolderError::BaseFolder("file has no name".to_string()))?;
    let parent = txt_path.parent().unwrap_or_else(|| Path::new(""));

    let direct = parent.join(&stem);
    if !direct.exists() {
        return Ok(direct);
    }
    for n in 2..10_000 {
        let candidate = parent.join(format!("{}_{}", stem, n));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(Txt2FolderError::BaseFolder(
        "no free base folder name".to_string(),
    ))
}

/// First free variant of `name` within this run, case-insensitively:
/// the name itself, then `name_2`, `name_3`, ...
fn deduplicate(name: &str, used: &HashSet<String>) -> Option<String> {
    if !used.contains(&name.to_ascii_lowercase()) {
        return Some(name.to_string());
    }
    for n in 2..10_000 {
        let candidate = format!("{}_{}", name, n);
        if !used.contains(&candidate.to_ascii_lowercase()) {
            return Some(candidate);
        }
    }
    None
}
