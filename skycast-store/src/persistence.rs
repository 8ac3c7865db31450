//! File persistence helpers.
//!
//! Handles loading and saving documents to disk with owner-only
//! permissions.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Settings document name.
pub const SETTINGS_FILE: &str = "settings.json";
/// Saved locations document name.
pub const LOCATIONS_FILE: &str = "locations.json";
/// Weather cache document name.
pub const WEATHER_FILE: &str = "weather.json";
/// Last known GPS location document name.
pub const GPS_LOCATION_FILE: &str = "gps_location.json";

// ============================================================================
// Default Paths
// ============================================================================

// Directory name under the platform base directories
#[cfg(target_os = "macos")]
const APP_DIR: &str = "Skycast";
#[cfg(not(target_os = "macos"))]
const APP_DIR: &str = "skycast";

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.map_or_else(|| PathBuf::from("."), |b| b.join(APP_DIR))
}

/// Directory holding user-edited documents: settings and saved locations.
///
/// - macOS: `~/Library/Application Support/Skycast`
/// - Linux: `~/.config/skycast`
/// - Windows: `%APPDATA%\skycast`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let base = dirs::home_dir().map(|h| h.join("Library").join("Application Support"));
    #[cfg(not(target_os = "macos"))]
    let base = dirs::config_dir();
    app_dir(base)
}

/// Directory holding documents that can be rebuilt: the weather cache and
/// the last GPS fix.
///
/// - macOS: `~/Library/Caches/Skycast`
/// - Linux: `~/.cache/skycast`
/// - Windows: `%LOCALAPPDATA%\skycast`
pub fn default_cache_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    let base = dirs::home_dir().map(|h| h.join("Library").join("Caches"));
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();
    app_dir(base)
}

/// Path of `settings.json` in the config directory.
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join(SETTINGS_FILE)
}

/// Path of `weather.json` in the cache directory.
pub fn default_weather_path() -> PathBuf {
    default_cache_dir().join(WEATHER_FILE)
}

// ============================================================================
// Permissions
// ============================================================================

const FILE_MODE: u32 = 0o600;
const DIR_MODE: u32 = 0o700;

/// Applies an owner-only mode. The settings document carries the API key.
#[cfg(unix)]
async fn restrict(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await?;
    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Restricted permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn restrict(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// Documents
// ============================================================================

/// Creates the missing ancestors of `path`, restricting each one created.
async fn create_parent_dirs(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    let missing: Vec<&Path> = parent
        .ancestors()
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(parent).await?;
    for dir in missing.into_iter().rev() {
        restrict(dir, DIR_MODE).await?;
    }
    Ok(())
}

/// Writes `data` as pretty JSON.
///
/// The document is written next to its destination and renamed over it, so
/// readers never see a partial file. The result is owner-only on Unix.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    create_parent_dirs(path).await?;

    let json = serde_json::to_string_pretty(data)?;
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, json.as_bytes()).await?;
    restrict(&staging, FILE_MODE).await?;
    tokio::fs::rename(&staging, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "Saved document");
    Ok(())
}

/// Reads a JSON document.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "Loaded document");
    Ok(data)
}

/// Reads a JSON document; `Ok(None)` when the file does not exist.
pub async fn load_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match load_json(path).await {
        Ok(data) => Ok(Some(data)),
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads a JSON document, falling back to `T::default()` on any failure.
/// Only parse failures are logged.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json_opt(path).await {
        Ok(data) => data.unwrap_or_default(),
        Err(e) => {
            if matches!(e, StoreError::Serialization(_)) {
                warn!(path = %path.display(), error = %e, "Unreadable document, using defaults");
            }
            T::default()
        }
    }
}

/// Deletes a document; a missing file is not an error.
pub async fn remove_file_if_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed document");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert!(!default_config_dir().as_os_str().is_empty());
        assert!(!default_cache_dir().as_os_str().is_empty());
        assert!(default_settings_path().ends_with(SETTINGS_FILE));
        assert!(default_weather_path().ends_with(WEATHER_FILE));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_document_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let doc = temp_dir.path().join("settings.json");
        save_json(&doc, &serde_json::json!({"api_key": "k"})).await.unwrap();

        let mode = tokio::fs::metadata(&doc).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_created_dirs_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("a").join("b").join("doc.json");
        save_json(&file, &serde_json::json!({})).await.unwrap();

        for dir in [temp_dir.path().join("a"), temp_dir.path().join("a").join("b")] {
            let mode = tokio::fs::metadata(&dir).await.unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o700, "{} should be 0700", dir.display());
        }
    }

    #[tokio::test]
    async fn test_load_json_opt_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing: Option<Vec<String>> =
            load_json_opt(&temp_dir.path().join("none.json")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_remove_file_if_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("gone.json");
        remove_file_if_exists(&file).await.unwrap();

        tokio::fs::write(&file, "null").await.unwrap();
        remove_file_if_exists(&file).await.unwrap();
        assert!(!file.exists());
    }
}
