//! Platform detection and platform-specific paths.
//!
//! Only the desktop helpers and the folder-view launcher depend on this.
//! Comparison, search and rename never consult the platform.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Operating system family the process is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Unknown,
}

impl Platform {
    /// Detect the platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }
}

/// Get the user's desktop directory on the current platform.
///
/// # Errors
/// Returns `UnknownPlatform` on unsupported systems, or `MissingEnvironment`
/// if the home variable is unset.
pub fn desktop_path() -> Result<PathBuf, PlatformError> {
    desktop_path_for(Platform::current())
}

/// Get the desktop directory for a given platform.
///
/// # Platform Behavior
/// - Windows: `%USERPROFILE%\Desktop`
/// - macOS / Linux: `$HOME`
///
/// # Arguments
/// * `platform` - Platform to resolve for
///
/// # Errors
/// Returns `UnknownPlatform` for `Platform::Unknown`.
pub fn desktop_path_for(platform: Platform) -> Result<PathBuf, PlatformError> {
    match platform {
        Platform::Windows => std::env::var_os("USERPROFILE")
            .map(|home| PathBuf::from(home).join("Desktop"))
            .ok_or(PlatformError::MissingEnvironment {
                name: "USERPROFILE",
            }),
        Platform::MacOs | Platform::Linux => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or(PlatformError::MissingEnvironment { name: "HOME" }),
        Platform::Unknown => Err(PlatformError::UnknownPlatform {
            operation: "resolve the desktop path",
        }),
    }
}

/// Program and arguments that reveal a directory in the native file browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderViewCommand {
    /// Executable to launch.
    pub program: &'static str,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
}

/// Build the command that opens `path` in the platform's file browser.
///
/// # Arguments
/// * `platform` - Platform to build for
/// * `path` - Directory to reveal
///
/// # Errors
/// Returns `UnknownPlatform` for `Platform::Unknown`.
pub fn folder_view_command(
    platform: Platform,
    path: &Path,
) -> Result<FolderViewCommand, PlatformError> {
    let display: String = path.display().to_string();
    match platform {
        Platform::Windows => Ok(FolderViewCommand {
            program: "explorer",
            args: vec![format!("/root,{}", display)],
        }),
        Platform::MacOs => Ok(FolderViewCommand {
            program: "open",
            args: vec!["-R".to_string(), display],
        }),
        Platform::Linux => Ok(FolderViewCommand {
            program: "xdg-open",
            args: vec![display],
        }),
        Platform::Unknown => Err(PlatformError::UnknownPlatform {
            operation: "open the folder viewer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_platform_is_deterministic() {
        assert_eq!(Platform::current(), Platform::current());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_current_platform_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
    }

    #[test]
    fn test_desktop_path_unknown_platform() {
        let result: Result<PathBuf, PlatformError> = desktop_path_for(Platform::Unknown);
        assert!(matches!(result, Err(PlatformError::UnknownPlatform { .. })));
    }

    #[test]
    fn test_folder_view_command_per_platform() {
        let path: &Path = Path::new("/data/photos");

        let windows: FolderViewCommand = folder_view_command(Platform::Windows, path).unwrap();
        assert_eq!(windows.program, "explorer");
        assert_eq!(windows.args, vec!["/root,/data/photos".to_string()]);

        let mac: FolderViewCommand = folder_view_command(Platform::MacOs, path).unwrap();
        assert_eq!(mac.program, "open");
        assert_eq!(mac.args[0], "-R");

        let linux: FolderViewCommand = folder_view_command(Platform::Linux, path).unwrap();
        assert_eq!(linux.program, "xdg-open");
    }

    #[test]
    fn test_folder_view_command_unknown_platform() {
        let result: Result<FolderViewCommand, PlatformError> =
            folder_view_command(Platform::Unknown, Path::new("/x"));
        assert!(result.is_err());
    }
}
