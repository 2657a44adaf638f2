//! Path normalization utilities for directory entities.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Convert a path to absolute without resolving symlinks.
///
/// # Arguments
/// * `path` - Path to convert (relative or absolute)
///
/// # Returns
/// Absolute path, joining with current directory if relative.
///
/// # Errors
/// Returns error if current directory cannot be determined.
pub fn to_absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::env::current_dir()
            .map(|cwd: PathBuf| cwd.join(path))
            .map_err(|e: std::io::Error| PathError::from_io(path.display().to_string(), e))
    }
}

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` components lexically.
/// Does not access the filesystem or resolve symlinks.
///
/// # Arguments
/// * `path` - Path to normalize
///
/// # Returns
/// Normalized path with `.` and `..` resolved lexically.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::ParentDir) | Some(Component::RootDir)
                    )
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Produce the platform-normalized absolute form of a directory path.
///
/// This is the `full_path` every directory entity carries: absolute,
/// lexically normalized, with no trailing separator.
///
/// # Arguments
/// * `path` - Path to normalize
///
/// # Errors
/// Returns error if the current directory is needed and cannot be read.
pub fn normalize_full_path(path: &Path) -> Result<PathBuf, PathError> {
    let absolute: PathBuf = to_absolute(path)?;
    Ok(lexical_normalize(&absolute))
}

/// Get the final segment of a path as an owned string.
///
/// # Arguments
/// * `path` - Path whose leaf is wanted
///
/// # Errors
/// Returns `NoLeafName` for paths such as `/` or `..`, or `NonUtf8Name` if
/// the leaf cannot be represented as a string without losing bytes.
pub fn leaf_name(path: &Path) -> Result<String, PathError> {
    let name: &OsStr = path.file_name().ok_or_else(|| PathError::NoLeafName {
        path: path.display().to_string(),
    })?;
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| PathError::NonUtf8Name {
            path: path.display().to_string(),
            name: name.to_string_lossy().into_owned(),
        })
}

/// Get the parent of a path.
///
/// # Arguments
/// * `path` - Path whose parent is wanted
///
/// # Errors
/// Returns `NoParent` for filesystem roots and bare names.
pub fn parent_of(path: &Path) -> Result<PathBuf, PathError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Err(PathError::NoParent {
            path: path.display().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_normalize_removes_dot() {
        let path: PathBuf = PathBuf::from("/a/./b/./c");
        let normalized: PathBuf = lexical_normalize(&path);
        assert_eq!(normalized, PathBuf::from("/a/b/c"));
    }

    #[test]
    fn test_lexical_normalize_resolves_dotdot() {
        let path: PathBuf = PathBuf::from("/a/b/../c");
        let normalized: PathBuf = lexical_normalize(&path);
        assert_eq!(normalized, PathBuf::from("/a/c"));
    }

    #[test]
    fn test_lexical_normalize_strips_trailing_separator() {
        let path: PathBuf = PathBuf::from("/a/b/");
        let normalized: PathBuf = lexical_normalize(&path);
        assert_eq!(normalized, PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_full_path_makes_relative_absolute() {
        let normalized: PathBuf = normalize_full_path(Path::new("some/./dir")).unwrap();
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("some/dir"));
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name(Path::new("/root/photos")).unwrap(), "photos");
        assert_eq!(leaf_name(Path::new("/root/a.b")).unwrap(), "a.b");
    }

    #[test]
    fn test_leaf_name_of_root_fails() {
        let result: Result<String, PathError> = leaf_name(Path::new("/"));
        assert!(matches!(result, Err(PathError::NoLeafName { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_leaf_name_rejects_non_utf8() {
        use std::os::unix::ffi::OsStrExt;

        // Given: A leaf that is Latin-1 encoded
        let path: PathBuf = Path::new("/root").join(OsStr::from_bytes(b"caf\xe9"));

        // When: Extracting the leaf
        let result: Result<String, PathError> = leaf_name(&path);

        // Then: It is refused instead of being replaced with U+FFFD
        assert!(matches!(result, Err(PathError::NonUtf8Name { .. })));
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(
            parent_of(Path::new("/root/photos")).unwrap(),
            PathBuf::from("/root")
        );
    }

    #[test]
    fn test_parent_of_bare_name_fails() {
        let result: Result<PathBuf, PathError> = parent_of(Path::new("photos"));
        assert!(matches!(result, Err(PathError::NoParent { .. })));
    }
}
