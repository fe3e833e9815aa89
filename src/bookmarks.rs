//! Persistent page bookmarks.
//!
//! Bookmarks are a flat list of 0-based page indices stored as a JSON array
//! under a single key (`"current_book"` unless configured otherwise). The
//! list is re-read on every query and rewritten in full on every toggle, so
//! the last writer wins.

use crate::error::GiftBookError;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// String key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, GiftBookError>;
    fn set(&self, key: &str, value: &str) -> Result<(), GiftBookError>;
}

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GiftBookError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GiftBookError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are free text; anything outside `[A-Za-z0-9_-]` becomes `_`.
    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, GiftBookError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GiftBookError::Storage {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), GiftBookError> {
        let storage_err = |e: std::io::Error| GiftBookError::Storage {
            key: key.to_string(),
            detail: e.to_string(),
        };
        std::fs::create_dir_all(&self.dir).map_err(storage_err)?;

        let path = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(storage_err)?;
        tmp.write_all(value.as_bytes()).map_err(storage_err)?;
        tmp.persist(&path).map_err(|e| storage_err(e.error))?;
        debug!("Stored key '{}' at {}", key, path.display());
        Ok(())
    }
}

/// The bookmarked pages of the open book.
#[derive(Clone)]
pub struct BookmarkSet {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl BookmarkSet {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored indices in insertion order.
    ///
    /// A missing entry is an empty set. An entry that is not a JSON array of
    /// non-negative integers is logged and treated as empty; the next toggle
    /// overwrites it.
    pub fn list(&self) -> Result<Vec<usize>, GiftBookError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<usize>>(&raw) {
            Ok(marks) => Ok(marks),
            Err(e) => {
                warn!("Ignoring unreadable bookmarks under '{}': {}", self.key, e);
                Ok(Vec::new())
            }
        }
    }

    pub fn contains(&self, index: usize) -> Result<bool, GiftBookError> {
        Ok(self.list()?.contains(&index))
    }

    /// Flip membership of `index` and persist the whole set.
    ///
    /// Returns whether the page is bookmarked afterwards.
    pub fn toggle(&self, index: usize) -> Result<bool, GiftBookError> {
        let mut marks = self.list()?;
        let now_marked = if marks.contains(&index) {
            marks.retain(|&i| i != index);
            false
        } else {
            marks.push(index);
            true
        };

        let json = serde_json::to_string(&marks).map_err(|e| GiftBookError::Storage {
            key: self.key.clone(),
            detail: e.to_string(),
        })?;
        self.store.set(&self.key, &json)?;
        debug!("Bookmark {} → {}", index, if now_marked { "on" } else { "off" });
        Ok(now_marked)
    }
}

impl std::fmt::Debug for BookmarkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookmarkSet").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_set() -> (Arc<MemoryStore>, BookmarkSet) {
        let store = Arc::new(MemoryStore::new());
        let set = BookmarkSet::new(store.clone(), "current_book");
        (store, set)
    }

    #[test]
    fn empty_store_has_no_marks() {
        let (_, set) = memory_set();
        assert!(set.list().unwrap().is_empty());
        assert!(!set.contains(0).unwrap());
    }

    #[test]
    fn toggle_persists_immediately() {
        let (store, set) = memory_set();
        assert!(set.toggle(4).unwrap());
        assert!(set.toggle(1).unwrap());
        assert_eq!(store.get("current_book").unwrap().as_deref(), Some("[4,1]"));
        assert!(set.contains(4).unwrap());
    }

    #[test]
    fn toggling_twice_restores_storage() {
        let (store, set) = memory_set();
        set.toggle(2).unwrap();
        let before = store.get("current_book").unwrap();

        assert!(set.toggle(7).unwrap());
        assert!(!set.toggle(7).unwrap());

        assert_eq!(store.get("current_book").unwrap(), before);
        assert_eq!(set.list().unwrap(), vec![2]);
    }

    #[test]
    fn garbage_entry_reads_as_empty() {
        let (store, set) = memory_set();
        store.set("current_book", "not json").unwrap();
        assert!(set.list().unwrap().is_empty());
        set.toggle(3).unwrap();
        assert_eq!(set.list().unwrap(), vec![3]);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("marks"));
        assert_eq!(store.get("current_book").unwrap(), None);

        store.set("current_book", "[1,2]").unwrap();
        assert!(dir.path().join("marks/current_book.json").exists());

        let reopened = FileStore::new(dir.path().join("marks"));
        assert_eq!(reopened.get("current_book").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn file_store_sanitises_keys() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(store.path_for("../a b"), PathBuf::from("/tmp/x/___a_b.json"));
    }
}
