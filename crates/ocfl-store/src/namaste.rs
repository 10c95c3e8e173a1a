//! NAMASTE declaration files.
//!
//! An OCFL object root carries exactly one declaration file named
//! `0=ocfl_object_<version>` whose content is the tag followed by a single
//! newline.

use ocfl_types::SpecVersion;

use crate::error::StoreResult;
use crate::traits::Storage;
use crate::{join, read_to_vec};

/// Prefix shared by every object declaration file name.
pub const OBJECT_DECLARATION_PREFIX: &str = "0=ocfl_object_";

/// The declaration file name for a spec version (`0=ocfl_object_1.1`).
pub fn declaration_name(spec: SpecVersion) -> String {
    format!("0={}", spec.object_tag())
}

/// The expected declaration file content (tag plus trailing newline).
pub fn declaration_body(spec: SpecVersion) -> String {
    format!("{}\n", spec.object_tag())
}

/// Write an object declaration into the root of `storage` at `root`.
pub fn write_declaration(storage: &dyn Storage, root: &str, spec: SpecVersion) -> StoreResult<()> {
    storage.write(
        &join(root, &declaration_name(spec)),
        declaration_body(spec).as_bytes(),
    )
}

/// List all object declaration file names present in a directory.
pub fn find_declarations(storage: &dyn Storage, root: &str) -> StoreResult<Vec<String>> {
    Ok(storage
        .list(root)?
        .into_iter()
        .filter(|e| !e.is_dir && e.name.starts_with(OBJECT_DECLARATION_PREFIX))
        .map(|e| e.name)
        .collect())
}

/// Check that a declaration file's content matches its name.
pub fn verify_declaration(storage: &dyn Storage, root: &str, name: &str) -> StoreResult<bool> {
    let spec = match SpecVersion::from_object_tag(name.trim_start_matches("0=")) {
        Ok(spec) => spec,
        Err(_) => return Ok(false),
    };
    let content = read_to_vec(storage, &join(root, name))?;
    Ok(content == declaration_body(spec).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;

    #[test]
    fn name_and_body() {
        assert_eq!(declaration_name(SpecVersion::V1_1), "0=ocfl_object_1.1");
        assert_eq!(declaration_body(SpecVersion::V1_1), "ocfl_object_1.1\n");
    }

    #[test]
    fn write_then_find_and_verify() {
        let store = MemoryStorage::new();
        store.write("obj/inventory.json", b"{}").unwrap();
        write_declaration(&store, "obj", SpecVersion::V1_1).unwrap();

        let found = find_declarations(&store, "obj").unwrap();
        assert_eq!(found, vec!["0=ocfl_object_1.1"]);
        assert!(verify_declaration(&store, "obj", "0=ocfl_object_1.1").unwrap());
    }

    #[test]
    fn wrong_body_fails_verification() {
        let store = MemoryStorage::new();
        store
            .write("obj/0=ocfl_object_1.1", b"ocfl_object_1.0\n")
            .unwrap();
        assert!(!verify_declaration(&store, "obj", "0=ocfl_object_1.1").unwrap());
    }

    #[test]
    fn unknown_version_fails_verification() {
        let store = MemoryStorage::new();
        store
            .write("obj/0=ocfl_object_9.9", b"ocfl_object_9.9\n")
            .unwrap();
        assert!(!verify_declaration(&store, "obj", "0=ocfl_object_9.9").unwrap());
    }
}
