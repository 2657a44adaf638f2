//! Folder name and separator validation.

use rusty_dirmanager_common::RESERVED_NAME_CHARS;

use crate::error::FileSystemError;

/// Check whether `name` can be used as a folder name.
///
/// Rejects blank names, the `.`/`..` aliases, control characters and the
/// reserved characters `\ / : * ? " < > |`.
pub fn is_valid_folder_name(name: &str) -> bool {
    validate_folder_name(name).is_ok()
}

/// Check whether `separator` can sit between a name and a generated token.
///
/// A separator must not be mistaken for part of the name, so word
/// characters (alphanumeric or `_`) are rejected along with the reserved
/// characters.
pub fn is_valid_separator(separator: char) -> bool {
    !(separator.is_alphanumeric()
        || separator == '_'
        || separator.is_control()
        || RESERVED_NAME_CHARS.contains(&separator))
}

/// Validate a folder name.
///
/// # Errors
/// Returns `InvalidArgument` for blank names, `InvalidName` otherwise.
pub fn validate_folder_name(name: &str) -> Result<(), FileSystemError> {
    if name.trim().is_empty() {
        return Err(FileSystemError::invalid_argument(
            "folder name cannot be empty or blank",
        ));
    }

    let reserved: bool = name
        .chars()
        .any(|c| c.is_control() || RESERVED_NAME_CHARS.contains(&c));

    if reserved || name == "." || name == ".." {
        return Err(FileSystemError::InvalidName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Validate an optional separator. `None` means no separator.
///
/// # Errors
/// Returns `InvalidSeparator` if the separator is rejected.
pub fn validate_separator(separator: Option<char>) -> Result<(), FileSystemError> {
    match separator {
        Some(c) if !is_valid_separator(c) => Err(FileSystemError::InvalidSeparator { separator: c }),
        _ => Ok(()),
    }
}
