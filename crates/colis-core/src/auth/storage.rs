//! Key/value backends for persisted credentials.
//!
//! The token store only ever needs string values under a handful of fixed
//! keys, so backends are a thin get/set/remove surface. Failures inside a
//! backend are logged and reported as absence.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// File name used by [`FileStorage`] inside its directory
pub const TOKENS_FILE: &str = "tokens.json";

/// Durable string storage keyed by fixed names.
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// Write several entries as one logical update.
    fn set_many(&self, entries: &[(&str, &str)]) {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Remove several entries as one logical update.
    fn remove_many(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn set_many(&self, entries: &[(&str, &str)]) {
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_many(&self, keys: &[&str]) {
        let mut map = self.entries.lock();
        for key in keys {
            map.remove(*key);
        }
    }
}

/// JSON file storage, one object holding every key.
///
/// The file is re-read on every access so that a login performed by another
/// process is picked up. Writes go through a process-wide lock to keep
/// read-modify-write cycles from interleaving.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage backed by `tokens.json` inside `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(TOKENS_FILE))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        if !self.path.exists() {
            return HashMap::new();
        }
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                return HashMap::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to parse token file");
            HashMap::new()
        })
    }

    fn write_all(&self, entries: &HashMap<String, String>) {
        if let Err(e) = self.try_write_all(entries) {
            warn!(path = %self.path.display(), error = %e, "Failed to write token file");
        }
    }

    fn try_write_all(&self, entries: &HashMap<String, String>) -> std::io::Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        // Readers take no lock: swap in a complete file so they see either
        // the old contents or the new ones
        let contents = serde_json::to_string_pretty(entries)?;
        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(contents.as_bytes())?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Token file written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_all();
        apply(&mut entries);
        self.write_all(&entries);
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| {
            entries.remove(key);
        });
    }

    fn set_many(&self, pairs: &[(&str, &str)]) {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert(key.to_string(), value.to_string());
            }
        });
    }

    fn remove_many(&self, keys: &[&str]) {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("accessToken"), None);

        storage.set("accessToken", "abc");
        assert_eq!(storage.get("accessToken").as_deref(), Some("abc"));

        storage.remove("accessToken");
        assert_eq!(storage.get("accessToken"), None);
    }

    #[test]
    fn test_memory_storage_batches() {
        let storage = MemoryStorage::new();
        storage.set_many(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(storage.get("b").as_deref(), Some("2"));

        storage.remove_many(&["a", "b"]);
        assert_eq!(storage.get("a"), None);
        assert_eq!(storage.get("b"), None);
        assert_eq!(storage.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let first = FileStorage::new(dir.path());
        first.set_many(&[("accessToken", "a"), ("refreshToken", "b")]);

        let second = FileStorage::new(dir.path());
        assert_eq!(second.get("accessToken").as_deref(), Some("a"));
        assert_eq!(second.get("refreshToken").as_deref(), Some("b"));
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.get("accessToken"), None);

        // Writing creates the parent directory
        storage.set("accessToken", "a");
        assert!(storage.path().exists());
    }

    #[test]
    fn test_file_storage_removes_file_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("user", "{}");
        storage.remove_many(&["user"]);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_file_storage_reader_never_sees_partial_write() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set_many(&[("accessToken", "a0"), ("refreshToken", "r0")]);
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..500 {
                    let access = format!("a{}", i);
                    let refresh = format!("r{}", i);
                    storage.set_many(&[
                        ("accessToken", access.as_str()),
                        ("refreshToken", refresh.as_str()),
                    ]);
                }
                done.store(true, Ordering::SeqCst);
            });

            let mut reads = 0;
            while !done.load(Ordering::SeqCst) || reads == 0 {
                assert!(storage.get("accessToken").is_some());
                reads += 1;
            }
        });

        assert_eq!(storage.get("accessToken").as_deref(), Some("a499"));
    }

    #[test]
    fn test_file_storage_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        std::fs::write(storage.path(), "not json").unwrap();
        assert_eq!(storage.get("accessToken"), None);
    }
}
