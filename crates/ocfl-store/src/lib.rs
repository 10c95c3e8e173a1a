//! Abstract storage tree for the OCFL toolkit.
//!
//! The builder and validator never touch the filesystem directly; they work
//! against the [`Storage`] trait, which models the minimal operations OCFL
//! needs: list one directory level, read and write byte streams, existence
//! checks, and directory creation. Two backends ship here:
//!
//! - [`FsStorage`] — a local directory tree
//! - [`MemoryStorage`] — map-backed, for tests and embedding
//!
//! NAMASTE declaration helpers live in [`namaste`].

pub mod error;
pub mod fs;
pub mod memory;
pub mod namaste;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsStorage;
pub use memory::MemoryStorage;
pub use traits::{EntryInfo, Storage};

/// Read an entire file from storage into memory.
pub fn read_to_vec(storage: &dyn Storage, path: &str) -> StoreResult<Vec<u8>> {
    let mut reader = storage.open_read(path)?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Join two `/`-separated relative paths, ignoring empty components.
pub fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{rest}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_empty_sides() {
        assert_eq!(join("", "a/b"), "a/b");
        assert_eq!(join("a", ""), "a");
        assert_eq!(join("a", "b/c"), "a/b/c");
    }
}
