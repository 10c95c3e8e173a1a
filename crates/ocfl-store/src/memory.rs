use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{EntryInfo, Storage};

/// In-memory, map-backed storage tree.
///
/// Intended for tests and embedding. Files are held behind a `RwLock` and
/// cloned on read. Directories exist implicitly as file-path prefixes and
/// explicitly via `make_dir`.
#[derive(Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    dirs: RwLock<BTreeSet<String>>,
}

impl MemoryStorage {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files currently stored.
    pub fn file_count(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    /// Read a file's bytes directly (test convenience).
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().expect("lock poisoned").get(path).cloned()
    }

    fn is_dir(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        if self.dirs.read().expect("lock poisoned").contains(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.files
            .read()
            .expect("lock poisoned")
            .keys()
            .any(|k| k.starts_with(&prefix))
    }
}

impl Storage for MemoryStorage {
    fn list(&self, path: &str) -> StoreResult<Vec<EntryInfo>> {
        if !self.is_dir(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let mut entries = BTreeSet::new();
        for key in self.files.read().expect("lock poisoned").keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((dir, _)) => entries.insert(EntryInfo::dir(dir)),
                    None => entries.insert(EntryInfo::file(rest)),
                };
            }
        }
        for dir in self.dirs.read().expect("lock poisoned").iter() {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                let first = rest.split('/').next().unwrap_or(rest);
                if !first.is_empty() {
                    entries.insert(EntryInfo::dir(first));
                }
            }
        }
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open_read(&self, path: &str) -> StoreResult<Box<dyn Read + '_>> {
        let files = self.files.read().expect("lock poisoned");
        let data = files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        if path.is_empty() {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "cannot write to the root".into(),
            });
        }
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.files.read().expect("lock poisoned").contains_key(path) || self.is_dir(path))
    }

    fn make_dir(&self, path: &str) -> StoreResult<()> {
        if !path.is_empty() {
            self.dirs
                .write()
                .expect("lock poisoned")
                .insert(path.to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("file_count", &self.file_count())
            .finish()
    }
}
