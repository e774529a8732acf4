//! Persistent slice progress.
//!
//! [`ProgressStore`] holds one boolean flag per slice name, `true` once the
//! slice has been completed. It is loaded once at startup, outlives every
//! scene and is written back to disk on every change, so progress survives a
//! crash or a killed process.
//!
//! The file is a flat JSON object:
//!
//! ```json
//! { "Intro_Slice 0": true, "Intro_Slice 1": false }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use log::{debug, error, info, warn};

#[derive(Resource, Debug, Clone, Default)]
pub struct ProgressStore {
    flags: BTreeMap<String, bool>,
    path: Option<PathBuf>,
}

impl ProgressStore {
    /// Load the store backed by `path`.
    ///
    /// A missing file starts an empty store; the file is created on the first
    /// write. A file that does not parse is moved aside to `<name>.bak` before
    /// anything is written over it. When it cannot be read or moved, the
    /// store runs detached from disk for this session.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            info!("No progress file at {}, starting fresh", path.display());
            return Self {
                flags: BTreeMap::new(),
                path: Some(path),
            };
        }
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                error!(
                    "Failed to read progress file {}: {}; progress will not be saved",
                    path.display(),
                    e
                );
                return Self::in_memory();
            }
        };
        match serde_json::from_str::<BTreeMap<String, bool>>(&json) {
            Ok(flags) => {
                info!("Loaded {} progress flag(s) from {}", flags.len(), path.display());
                Self {
                    flags,
                    path: Some(path),
                }
            }
            Err(e) => {
                warn!("Failed to parse progress file {}: {}", path.display(), e);
                let backup = backup_path(&path);
                match std::fs::rename(&path, &backup) {
                    Ok(()) => {
                        warn!("Unreadable progress moved to {}", backup.display());
                        Self {
                            flags: BTreeMap::new(),
                            path: Some(path),
                        }
                    }
                    Err(e) => {
                        error!(
                            "Failed to move {} aside: {}; progress will not be saved",
                            path.display(),
                            e
                        );
                        Self::in_memory()
                    }
                }
            }
        }
    }

    /// Store without a backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_flag(&self, key: &str, default: bool) -> bool {
        self.flags.get(key).copied().unwrap_or(default)
    }

    /// Set `key` and write the store to disk.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        let key = key.into();
        if self.flags.get(&key) == Some(&value) {
            return;
        }
        debug!("Progress '{}' = {}", key, value);
        self.flags.insert(key, value);
        if let Err(e) = self.flush() {
            error!("{}", e);
        }
    }

    /// Add every key in `keys` that is not stored yet with `false`.
    /// Returns how many keys were added.
    pub fn ensure_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for key in keys {
            if !self.flags.contains_key(key) {
                self.flags.insert(key.to_owned(), false);
                added += 1;
            }
        }
        added
    }

    /// Remove every key in `keys`. Returns how many were present.
    pub fn remove<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        keys.into_iter()
            .filter(|key| self.flags.remove(*key).is_some())
            .count()
    }

    /// Write the store to its backing file, if it has one.
    pub fn flush(&self) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.flags)
            .map_err(|e| format!("Failed to serialize progress: {}", e))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create progress directory {}: {}", parent.display(), e)
                })?;
            }
        }
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write progress file {}: {}", path.display(), e))
    }

    /// Number of completed slices.
    pub fn completed(&self) -> usize {
        self.flags.values().filter(|v| **v).count()
    }

    /// Number of known slices.
    pub fn total(&self) -> usize {
        self.flags.len()
    }

    /// Completed share in percent, `0.0` for an empty store.
    pub fn percentage(&self) -> f32 {
        if self.flags.is_empty() {
            return 0.0;
        }
        self.completed() as f32 * 100.0 / self.total() as f32
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// `progress.json` -> `progress.json.bak`
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_flag_default() {
        let store = ProgressStore::in_memory();
        assert!(!store.get_flag("Intro_Slice 0", false));
        assert!(store.get_flag("Intro_Slice 0", true));
    }

    #[test]
    fn test_set_flag_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saves").join("progress.json");
        let mut store = ProgressStore::load(&path);
        store.set_flag("Intro_Slice 0", true);

        let reloaded = ProgressStore::load(&path);
        assert!(reloaded.get_flag("Intro_Slice 0", false));
        assert_eq!(reloaded.total(), 1);
    }

    #[test]
    fn test_corrupt_file_is_kept_as_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut store = ProgressStore::load(&path);
        assert_eq!(store.total(), 0);

        store.set_flag("Intro_Slice 0", true);
        let backup = dir.path().join("progress.json.bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
        assert!(ProgressStore::load(&path).get_flag("Intro_Slice 0", false));
    }

    #[test]
    fn test_ensure_keys_keeps_existing_values() {
        let mut store = ProgressStore::in_memory();
        store.set_flag("A_Slice 0", true);
        let added = store.ensure_keys(["A_Slice 0", "A_Slice 1", "A_Slice 2"]);
        assert_eq!(added, 2);
        assert!(store.get_flag("A_Slice 0", false));
        assert!(!store.get_flag("A_Slice 1", true));
    }

    #[test]
    fn test_summary_counts() {
        let mut store = ProgressStore::in_memory();
        assert_eq!(store.percentage(), 0.0);
        store.ensure_keys(["a", "b", "c", "d"]);
        store.set_flag("a", true);
        assert_eq!(store.completed(), 1);
        assert_eq!(store.total(), 4);
        assert_eq!(store.percentage(), 25.0);
    }

    #[test]
    fn test_remove_keys() {
        let mut store = ProgressStore::in_memory();
        store.ensure_keys(["a", "b"]);
        assert_eq!(store.remove(["a", "missing"]), 1);
        assert_eq!(store.total(), 1);
    }
}
