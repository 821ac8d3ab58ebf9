// Gzip compression of the current selection.
//
// Each regular file becomes a sibling {name}.gz. Folders are only
// counted, not archived; gzip has no container format.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::{fs, io};

use flate2::write::GzEncoder;
use flate2::Compression;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressSummary {
    pub compressed: usize,
    pub skipped_folders: usize,
    pub failed: usize,
}

/// Compress every regular file in the selection next to itself.
pub fn compress_files(paths: &[PathBuf]) -> CompressSummary {
    let mut summary = CompressSummary::default();
    for path in paths {
        if path.is_dir() {
            crate::debug!("[Compress] Skipping folder {}", path.display());
            summary.skipped_folders += 1;
            continue;
        }
        match compress_one(path) {
            Ok(target) => {
                crate::debug!(
                    "[Compress] {} -> {}",
                    path.display(),
                    target.display()
                );
                summary.compressed += 1;
            }
            Err(e) => {
                crate::warn!("[Compress] {} failed: {}", path.display(), e);
                summary.failed += 1;
            }
        }
    }
    summary
}

fn compress_one(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let mut target = path.to_path_buf();
    target.set_file_name(format!("{}.gz", file_name.to_string_lossy()));

    // Never clobber an archive that is already there.
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "archive already exists",
        ));
    }

    match write_archive(path, &target) {
        Ok(()) => Ok(target),
        Err(e) => {
            // Drop the partial archive so a retry starts clean.
            let _ = fs::remove_file(&target);
            Err(e)
        }
    }
}

fn write_archive(source: &Path, target: &Path) -> io::Result<()> {
    let mut input = File::open(source)?;
    let output = File::create(target)?;
    let mut encoder = GzEncoder::new(output, Compression::best());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    Ok(())
}
