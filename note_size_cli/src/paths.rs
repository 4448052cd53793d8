//! Centralized path management for the note-size CLI
//!
//! Configuration lives under the platform config directory and the
//! persisted cache file under the platform data directory.

use std::path::{Path, PathBuf};

/// The name of the application directory used across all platforms
const APP_DIR: &str = "note-size";

/// The name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Extension of the media directory that sits next to an exported collection
const MEDIA_DIR_EXTENSION: &str = "media";

/// Returns the base data directory for the application
///
/// On Linux this follows the XDG Base Directory specification
/// (`~/.local/share/note-size`). Falls back to `.note-size` in the current
/// directory if no platform directory can be determined.
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".note-size"))
}

/// Returns the configuration directory
pub fn get_config_dir() -> PathBuf {
    // XDG_CONFIG_HOME wins on every Unix, including macOS
    #[cfg(not(target_os = "windows"))]
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg_config).join(APP_DIR);
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".note-size"))
}

pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}

/// Location of the persisted cache file
///
/// `cache_dir` overrides the data directory when set.
pub fn get_cache_file_path(cache_dir: Option<&Path>, file_name: &str) -> PathBuf {
    match cache_dir {
        Some(dir) => dir.join(file_name),
        None => get_data_dir().join(file_name),
    }
}

/// Media directory of an export when none is configured
///
/// `deck.json` keeps its media in `deck.media` beside it.
pub fn default_media_dir(collection_path: &Path) -> PathBuf {
    collection_path.with_extension(MEDIA_DIR_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_contains_app_name() {
        let data_dir = get_data_dir();
        assert!(
            data_dir.to_string_lossy().contains(APP_DIR),
            "Data dir should contain '{APP_DIR}': {}",
            data_dir.display()
        );
    }

    #[test]
    fn test_config_path_is_in_config_dir() {
        let config_path = get_config_path();
        assert!(config_path.starts_with(get_config_dir()));
        assert_eq!(
            config_path.file_name().and_then(|n| n.to_str()),
            Some(CONFIG_FILE)
        );
    }

    #[test]
    fn test_cache_file_defaults_to_data_dir() {
        let path = get_cache_file_path(None, "cache.bin");
        assert!(path.starts_with(get_data_dir()));
        assert!(path.ends_with("cache.bin"));
    }

    #[test]
    fn test_cache_dir_override() {
        let path = get_cache_file_path(Some(Path::new("/tmp/elsewhere")), "cache.bin");
        assert_eq!(path, PathBuf::from("/tmp/elsewhere/cache.bin"));
    }

    #[test]
    fn test_media_dir_sits_next_to_export() {
        assert_eq!(
            default_media_dir(Path::new("/data/collection.json")),
            PathBuf::from("/data/collection.media")
        );
        assert_eq!(
            default_media_dir(Path::new("export")),
            PathBuf::from("export.media")
        );
    }
}
