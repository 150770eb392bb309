use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Flat string key-value storage. Every persisted record is one JSON document
/// under one key.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Serializes read-modify-write sequences. Hold the guard from the read
    /// until the last write; `get`/`set`/`remove` never take it themselves.
    fn write_lock(&self) -> MutexGuard<'_, ()>;
}

fn lock(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Suffix source for temp files, so concurrent writers never share one.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed store: key `k` lives in `<dir>/k.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    writer: Mutex<()>,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            writer: Mutex::new(()),
        }
    }

    /// Store rooted at [`crate::data_dir`].
    pub fn open_default() -> Self {
        Self::new(crate::data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(key, path = %path.display(), "read record");
                Ok(Some(raw))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Atomic write (temp file + rename) so a crash never leaves a
    /// half-written record behind.
    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!(".{}.{}.{}.json.tmp", key, std::process::id(), seq));
        let path = self.path_for(key);
        fs::write(&tmp, value).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;
        debug!(key, path = %path.display(), bytes = value.len(), "wrote record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        lock(&self.writer)
    }
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        lock(&self.writer)
    }
}

/// Read and decode a record. Missing keys are `Ok(None)`; undecodable ones
/// are `Error::Corrupt`.
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| Error::Corrupt {
                key: key.to_string(),
                source,
            }),
    }
}

pub fn write_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("seo-policy").unwrap(), None);
        store.set("seo-policy", "{\"a\":1}").unwrap();
        assert_eq!(store.get("seo-policy").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(dir.path().join("nested/seo-policy.json").exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");

        store.remove("seo-policy").unwrap();
        store.remove("seo-policy").unwrap();
        assert_eq!(store.get("seo-policy").unwrap(), None);
    }

    #[test]
    fn concurrent_sets_of_one_key_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::thread::scope(|scope| {
            for i in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for j in 0..20 {
                        store.set("seo-policy", &format!("{}", i * 100 + j)).unwrap();
                    }
                });
            }
        });
        let raw = store.get("seo-policy").unwrap().unwrap();
        assert!(raw.parse::<u32>().is_ok(), "{raw}");
    }

    #[test]
    fn malformed_json_surfaces_as_corrupt() {
        let store = MemoryStore::new();
        store.set("broken", "{not json").unwrap();
        let err = read_json::<serde_json::Value>(&store, "broken").unwrap_err();
        assert!(matches!(err, Error::Corrupt { ref key, .. } if key == "broken"));
    }
}
