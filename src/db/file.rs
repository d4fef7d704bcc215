//! Directory-backed key-value store: one `<key>.json` file per key.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use super::{validate_key, KeyValueStore, StoreError};

const EXTENSION: &str = "json";

pub struct FileKeyValueStore {
    dir: PathBuf,
    // Serializes writers within this process; other processes are not coordinated.
    lock: RwLock<()>,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        debug!("Opened key-value store at {}", dir.display());
        Ok(Self {
            dir,
            lock: RwLock::new(()),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.lock.read();
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let _guard = self.lock.write();
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let _guard = self.lock.write();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let _guard = self.lock.read();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(tmp.path()).unwrap();

        store.set("sms_settings", r#"{"currency":"KES"}"#).unwrap();

        assert_eq!(
            store.get("sms_settings").unwrap().as_deref(),
            Some(r#"{"currency":"KES"}"#)
        );
        assert!(tmp.path().join("sms_settings.json").exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(tmp.path()).unwrap();
        assert!(store.get("sms_campaigns").unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(tmp.path()).unwrap();

        store.set("sms_users", "[]").unwrap();
        store.remove("sms_users").unwrap();
        store.remove("sms_users").unwrap();

        assert!(store.get("sms_users").unwrap().is_none());
    }

    #[test]
    fn test_keys_lists_only_json_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(tmp.path()).unwrap();
        store.set("sms_statistics", "{}").unwrap();
        store.set("sms_campaigns", "[]").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["sms_campaigns", "sms_statistics"]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(tmp.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
    }
}
