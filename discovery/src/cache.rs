//! Snapshot persistence for discovered command trees.
//!
//! A snapshot is one pretty-printed JSON file per base command holding a
//! [`CommandCache`]. Reads are lenient: anything unreadable is a miss.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use command_tools_core::{CommandCache, CommandNode};
use tracing::debug;

use crate::error::CacheError;

/// Default snapshot directory (`$XDG_CACHE_HOME/command-tools` or
/// `~/.cache/command-tools`).
pub fn default_dir() -> PathBuf {
    dirs_cache_dir().join("command-tools")
}

/// File name for a command's snapshot.
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`.
///
/// # Examples
///
/// ```
/// use command_tools_discovery::cache::cache_file_name;
///
/// assert_eq!(cache_file_name("az"), "az_cache.json");
/// assert_eq!(cache_file_name("/usr/bin/git lfs"), "_usr_bin_git_lfs_cache.json");
/// ```
pub fn cache_file_name(command: &str) -> String {
    let sanitized: String = command
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}_cache.json")
}

/// Snapshot path for `command` under `dir`.
pub fn snapshot_path(dir: &Path, command: &str) -> PathBuf {
    dir.join(cache_file_name(command))
}

/// Loads a snapshot. Returns `None` for a missing file, malformed JSON, or
/// a document missing required fields.
pub fn load_snapshot(path: &Path) -> Option<CommandCache> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No usable snapshot");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(cache) => Some(cache),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Snapshot is malformed; ignoring");
            None
        }
    }
}

/// Writes a snapshot stamped with the current time, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`CacheError::Io`] if the directory or file cannot be written and
/// [`CacheError::Json`] if serialization fails.
pub fn save_snapshot(command: &str, tree: &CommandNode, path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let cache = CommandCache::new(command, Utc::now().timestamp_millis(), tree.clone());
    let json = serde_json::to_string_pretty(&cache)?;
    fs::write(path, json)?;
    debug!(command, path = %path.display(), nodes = tree.node_count(), "Saved snapshot");
    Ok(())
}

fn dirs_cache_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cache");
    }
    PathBuf::from("/tmp")
}
