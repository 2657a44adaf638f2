//! Recursive copy and same-volume move of whole directories.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rusty_dirmanager_common::PathError;
use rusty_dirmanager_filesystem::FileSystemError;
use walkdir::WalkDir;

/// Move `source` into `dest_dir`, keeping its name.
///
/// # Arguments
/// * `source` - Directory to move
/// * `dest_dir` - Existing directory that will contain it
///
/// # Returns
/// The new path of the moved directory.
///
/// # Errors
/// Returns `NotFound` if either directory is missing, or an IO error if the
/// target already exists or the OS refuses the move (for example across
/// volumes).
pub fn move_directory(source: &Path, dest_dir: &Path) -> Result<PathBuf, FileSystemError> {
    if !source.is_dir() {
        return Err(FileSystemError::not_found(source));
    }
    if !dest_dir.is_dir() {
        return Err(FileSystemError::not_found(dest_dir));
    }

    let target: PathBuf = dest_dir.join(leaf(source)?);
    if target.symlink_metadata().is_ok() {
        return Err(FileSystemError::io(
            &target,
            std::io::Error::new(ErrorKind::AlreadyExists, "destination already exists"),
        ));
    }

    std::fs::rename(source, &target).map_err(|e| FileSystemError::io(source, e))?;
    tracing::debug!("Moved {} to {}", source.display(), target.display());
    Ok(target)
}

/// Copy `source` into `dest_dir`, keeping its name.
///
/// The target directory is created if needed and merged into if it already
/// exists. Symlinks are skipped.
///
/// # Arguments
/// * `source` - Directory to copy
/// * `dest_dir` - Directory that will contain the copy (created if missing)
/// * `copy_subdirs` - Copy nested directories too, not only top-level files
/// * `overwrite_files` - Replace files that already exist at the target
///
/// # Returns
/// The path of the copy.
///
/// # Errors
/// Returns `NotFound` if `source` is missing, `InvalidArgument` if the copy
/// would land inside `source`, or an IO error if a target file exists and
/// `overwrite_files` is false.
pub fn copy_directory(
    source: &Path,
    dest_dir: &Path,
    copy_subdirs: bool,
    overwrite_files: bool,
) -> Result<PathBuf, FileSystemError> {
    if !source.is_dir() {
        return Err(FileSystemError::not_found(source));
    }

    let target: PathBuf = dest_dir.join(leaf(source)?);
    if target.starts_with(source) {
        return Err(FileSystemError::invalid_argument(format!(
            "cannot copy {} into itself",
            source.display()
        )));
    }

    std::fs::create_dir_all(&target).map_err(|e| FileSystemError::io(&target, e))?;

    let max_depth: usize = if copy_subdirs { usize::MAX } else { 1 };
    for entry in WalkDir::new(source)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
    {
        let entry: walkdir::DirEntry = entry.map_err(|e| FileSystemError::IoError {
            path: e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            source: e.into(),
        })?;

        let relative: &Path = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| FileSystemError::invalid_argument("walked outside the source tree"))?;
        let dest: PathBuf = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| FileSystemError::io(&dest, e))?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &dest, overwrite_files)?;
        } else {
            tracing::warn!("Skipping symlink {}", entry.path().display());
        }
    }

    tracing::debug!("Copied {} to {}", source.display(), target.display());
    Ok(target)
}

/// Leaf of `source`, kept as raw OS bytes so the target name is exact.
fn leaf(source: &Path) -> Result<&OsStr, FileSystemError> {
    source.file_name().ok_or_else(|| {
        FileSystemError::Path(PathError::NoLeafName {
            path: source.display().to_string(),
        })
    })
}

fn copy_file(from: &Path, to: &Path, overwrite: bool) -> Result<(), FileSystemError> {
    if !overwrite && to.symlink_metadata().is_ok() {
        return Err(FileSystemError::io(
            to,
            std::io::Error::new(ErrorKind::AlreadyExists, "destination file already exists"),
        ));
    }
    std::fs::copy(from, to).map_err(|e| FileSystemError::io(from, e))?;
    Ok(())
}
