use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::traits::{EntryInfo, Storage};

/// Local-filesystem storage rooted at a directory.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Open a storage tree rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    /// Create the root directory if missing, then open it.
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory on disk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(path);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(StoreError::InvalidPath {
                        path: path.to_string(),
                        reason: "only relative paths without '..' are allowed".into(),
                    })
                }
            }
        }
        Ok(self.root.join(rel))
    }
}

impl Storage for FsStorage {
    fn list(&self, path: &str) -> StoreResult<Vec<EntryInfo>> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type()?.is_dir();
            entries.push(EntryInfo { name, is_dir });
        }
        entries.sort();
        Ok(entries)
    }

    fn open_read(&self, path: &str) -> StoreResult<Box<dyn Read + '_>> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(Box::new(File::open(full)?))
    }

    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, data)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.resolve(path)?.exists())
    }

    fn make_dir(&self, path: &str) -> StoreResult<()> {
        std::fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }

    fn walk_files(&self, path: &str) -> StoreResult<Vec<String>> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .expect("walkdir stays under root");
            let joined = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(joined);
        }
        files.sort();
        Ok(files)
    }
}

impl std::fmt::Debug for FsStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStorage").field("root", &self.root).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_to_vec;

    fn storage() -> (tempfile::TempDir, FsStorage) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStorage::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn write_read_roundtrip() {
        let (_dir, store) = storage();
        store.write("a/b/file.txt", b"hello").unwrap();
        assert!(store.exists("a/b/file.txt").unwrap());
        assert_eq!(read_to_vec(&store, "a/b/file.txt").unwrap(), b"hello");
    }

    #[test]
    fn list_is_sorted_one_level() {
        let (_dir, store) = storage();
        store.write("z.txt", b"z").unwrap();
        store.write("sub/inner.txt", b"i").unwrap();
        store.write("a.txt", b"a").unwrap();
        let entries = store.list("").unwrap();
        assert_eq!(
            entries,
            vec![
                EntryInfo::file("a.txt"),
                EntryInfo::dir("sub"),
                EntryInfo::file("z.txt"),
            ]
        );
    }

    #[test]
    fn walk_files_is_recursive_and_root_relative() {
        let (_dir, store) = storage();
        store.write("v1/content/a.txt", b"a").unwrap();
        store.write("v1/content/d/b.txt", b"b").unwrap();
        store.write("inventory.json", b"{}").unwrap();
        assert_eq!(
            store.walk_files("v1").unwrap(),
            vec!["v1/content/a.txt", "v1/content/d/b.txt"]
        );
    }

    #[test]
    fn missing_paths_are_not_found() {
        let (_dir, store) = storage();
        assert!(matches!(
            store.list("nope"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.open_read("nope.txt"),
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.exists("nope").unwrap());
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let (_dir, store) = storage();
        assert!(matches!(
            store.open_read("../escape"),
            Err(StoreError::InvalidPath { .. })
        ));
    }
}
