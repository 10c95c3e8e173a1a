use std::io::Read;

use crate::error::StoreResult;

/// One entry in a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryInfo {
    /// Entry name (a single path segment, no separators).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl EntryInfo {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Abstract storage tree.
///
/// Paths are `/`-separated strings relative to the backend root; the empty
/// string names the root itself. All implementations must satisfy:
/// - `list` returns one directory level, sorted by name.
/// - `write` creates missing parent directories.
/// - Reads observe prior writes (no caching surprises within one backend).
/// - All I/O errors are propagated, never silently ignored.
pub trait Storage: Send + Sync {
    /// List the direct children of a directory, sorted by name.
    ///
    /// Returns `Err(StoreError::NotFound)` when the directory does not exist.
    fn list(&self, path: &str) -> StoreResult<Vec<EntryInfo>>;

    /// Open a file for streamed reading.
    fn open_read(&self, path: &str) -> StoreResult<Box<dyn Read + '_>>;

    /// Write a file, creating parent directories as needed.
    ///
    /// Overwrites any existing file at the path.
    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()>;

    /// Check whether a file or directory exists.
    fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Create a directory (and missing parents).
    fn make_dir(&self, path: &str) -> StoreResult<()>;

    /// Recursively list all file paths under a directory, sorted.
    ///
    /// Paths are relative to the backend root, not to `path`. The default
    /// implementation walks via `list`; backends may override.
    fn walk_files(&self, path: &str) -> StoreResult<Vec<String>> {
        let mut files = Vec::new();
        let mut stack = vec![path.to_string()];
        while let Some(dir) = stack.pop() {
            for entry in self.list(&dir)? {
                let full = crate::join(&dir, &entry.name);
                if entry.is_dir {
                    stack.push(full);
                } else {
                    files.push(full);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}
