//! Path helpers for config and log locations

use std::path::{Path, PathBuf};

use crate::core::constants::STDIN_PATH;

/// Expand a user-supplied path to an absolute path.
///
/// - `~` and `~/rest` resolve against the home directory
/// - relative paths resolve against the current directory (not canonicalized)
/// - absolute paths pass through
/// - empty input yields the current directory
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') || rest.starts_with('\\') => dirs::home_dir()
            .map(|home| home.join(&rest[1..]))
            .unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Resolve a log path argument. `None` means stdin (argument omitted or `-`).
pub fn resolve_log_path(arg: Option<&Path>) -> Option<PathBuf> {
    match arg {
        None => None,
        Some(path) if path.as_os_str() == STDIN_PATH => None,
        Some(path) => Some(expand_path(&path.to_string_lossy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_absolute_unix() {
        assert_eq!(expand_path("/var/log/chat.json"), PathBuf::from("/var/log/chat.json"));
    }

    #[test]
    fn test_expand_path_relative() {
        let result = expand_path("logs/session.jsonl");
        assert!(result.is_absolute());
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(result, cwd.join("logs/session.jsonl"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let result = expand_path("~/.chatflow/chatflow.json");
        assert!(result.is_absolute());
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".chatflow/chatflow.json"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
        }
    }

    #[test]
    fn test_expand_path_tilde_inside_name_is_literal() {
        // only a leading `~/` refers to the home directory
        let result = expand_path("~backup.json");
        assert!(result.ends_with("~backup.json"));
    }

    #[test]
    fn test_expand_path_trims_and_handles_empty() {
        assert_eq!(expand_path("  /tmp/a.json  "), PathBuf::from("/tmp/a.json"));
        assert!(expand_path("   ").is_absolute());
    }

    #[test]
    fn test_resolve_log_path_stdin() {
        assert!(resolve_log_path(None).is_none());
        assert!(resolve_log_path(Some(Path::new("-"))).is_none());

        let resolved = resolve_log_path(Some(Path::new("log.json"))).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("log.json"));
    }
}
