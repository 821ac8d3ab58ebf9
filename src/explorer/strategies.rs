// Path resolution strategies, strict priority order:
// document folder self-path, then file-scheme location URL, then the
// location name taken as a path. Each is a pure function over one window
// so the policy stays testable without the automation layer.

use std::path::{PathBuf, MAIN_SEPARATOR};

use super::automation::ShellWindow;

/// Try every strategy against one window, first hit wins.
pub fn resolve_path_from(window: &dyn ShellWindow) -> Option<PathBuf> {
    document_folder_path(window)
        .or_else(|| location_url_path(window))
        .or_else(|| location_name_path(window))
}

/// Primary: the document's own folder path.
pub fn document_folder_path(window: &dyn ShellWindow) -> Option<PathBuf> {
    let path = window.document()?.folder_path()?;
    normalize_existing_dir(path)
}

/// Secondary: parse the location URL as a file-scheme URL.
pub fn location_url_path(window: &dyn ShellWindow) -> Option<PathBuf> {
    let url = window.location_url()?;
    let path = file_url_to_path(&url)?;
    normalize_existing_dir(path)
}

/// Tertiary: some views report the location name as a plain path already.
pub fn location_name_path(window: &dyn ShellWindow) -> Option<PathBuf> {
    let name = window.location_name()?;
    let candidate = PathBuf::from(name);
    if !candidate.is_absolute() {
        return None;
    }
    normalize_existing_dir(candidate)
}

/// Convert a file-scheme URL to a native path: strip the scheme,
/// percent-decode, drop the leading slash in front of a drive letter,
/// convert separators. Returns None for other schemes or malformed
/// percent escapes.
pub fn file_url_to_path(url: &str) -> Option<PathBuf> {
    let rest = strip_file_scheme(url)?;
    let decoded = urlencoding::decode(rest).ok()?;
    let mut path = decoded.into_owned();

    // "file:///C:/Users" leaves "/C:/Users"; the slash before the drive
    // letter is URL syntax, not part of the path.
    let bytes = path.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
        path.remove(0);
    }
    if MAIN_SEPARATOR != '/' {
        path = path.replace('/', &MAIN_SEPARATOR.to_string());
    }
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

fn strip_file_scheme(url: &str) -> Option<&str> {
    const SCHEME: &str = "file://";
    if url.len() < SCHEME.len() || !url[..SCHEME.len()].eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    Some(&url[SCHEME.len()..])
}

/// Accept only a path that is an existing directory right now; returned
/// with components reassembled so separators are canonical and no
/// trailing separator remains.
fn normalize_existing_dir(candidate: PathBuf) -> Option<PathBuf> {
    if candidate.as_os_str().is_empty() || !candidate.is_dir() {
        return None;
    }
    Some(candidate.components().collect())
}
