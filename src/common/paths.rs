//! Configuration, log and home directory paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/a11y-steps/` and `~/.local/share/a11y-steps/`
//! - macOS: `~/Library/Application Support/a11y-steps/`

use std::path::PathBuf;

/// Name used for the configuration and data directories
const APP_NAME: &str = "a11y-steps";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Expand a leading `~` to the user's home directory
///
/// Paths without a leading `~` are returned unchanged, as are all paths when
/// no home directory can be determined.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };

    match (rest, directories::BaseDirs::new()) {
        (Some(rest), Some(base)) => base.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}
