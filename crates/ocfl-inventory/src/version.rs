use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use ocfl_types::paths::validate_logical_path;

use crate::error::{InventoryError, InventoryResult};

/// The user recorded for a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>, address: Option<String>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// One version snapshot: creation metadata plus the state block mapping
/// content digests to the logical paths resolving to them.
///
/// Fields are declared in the alphabetical order of their JSON names so the
/// serialized document has sorted keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub created: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    state: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Version {
    /// Create a version with an empty state.
    pub fn new(
        created: DateTime<FixedOffset>,
        message: Option<String>,
        user: Option<User>,
    ) -> Self {
        Self {
            created,
            message,
            state: BTreeMap::new(),
            user,
        }
    }

    /// Create a version whose state is deep-copied from a prior version.
    pub fn carried_forward(
        created: DateTime<FixedOffset>,
        message: Option<String>,
        user: Option<User>,
        prior: &Version,
    ) -> Self {
        Self {
            created,
            message,
            state: prior.state.clone(),
            user,
        }
    }

    /// The state block: digest -> sorted logical paths.
    pub fn state(&self) -> &BTreeMap<String, Vec<String>> {
        &self.state
    }

    /// All logical paths in this version, sorted.
    pub fn logical_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .state
            .values()
            .flat_map(|v| v.iter().map(String::as_str))
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Whether a logical path exists in this version.
    pub fn contains_logical(&self, path: &str) -> bool {
        self.state.values().any(|paths| paths.iter().any(|p| p == path))
    }

    /// The digest a logical path resolves to, if present.
    pub fn digest_of(&self, path: &str) -> Option<&str> {
        self.state
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(digest, _)| digest.as_str())
    }

    /// Append a logical path under a digest.
    ///
    /// Fails with [`InventoryError::DuplicateLogicalPath`] when the path is
    /// already present under any digest.
    pub fn state_add(&mut self, digest: &str, logical_path: &str) -> InventoryResult<()> {
        validate_logical_path(logical_path)?;
        if self.contains_logical(logical_path) {
            return Err(InventoryError::DuplicateLogicalPath {
                path: logical_path.to_string(),
            });
        }
        let paths = self.state.entry(digest.to_ascii_lowercase()).or_default();
        paths.push(logical_path.to_string());
        paths.sort_unstable();
        Ok(())
    }

    /// Remove a logical path, dropping its digest entry when it was the last
    /// path. Returns the digest it was bound to.
    ///
    /// Fails with [`InventoryError::LogicalPathNotFound`] when absent.
    pub fn state_remove(&mut self, logical_path: &str) -> InventoryResult<String> {
        let digest = self
            .digest_of(logical_path)
            .ok_or_else(|| InventoryError::LogicalPathNotFound {
                path: logical_path.to_string(),
            })?
            .to_string();
        let paths = self.state.get_mut(&digest).expect("digest just looked up");
        paths.retain(|p| p != logical_path);
        if paths.is_empty() {
            self.state.remove(&digest);
        }
        Ok(digest)
    }

    /// Move a logical path to a new name, preserving its digest binding.
    pub fn state_rename(&mut self, old: &str, new: &str) -> InventoryResult<()> {
        validate_logical_path(new)?;
        if self.contains_logical(new) {
            return Err(InventoryError::DuplicateLogicalPath {
                path: new.to_string(),
            });
        }
        let digest = self.state_remove(old)?;
        self.state_add(&digest, new)
    }

    /// All digests referenced by this version's state.
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    /// Rewrite state digests through a mapping (digest-algorithm migration).
    ///
    /// Digests absent from the mapping are kept unchanged; path lists for
    /// digests that merge under the new algorithm are combined.
    pub(crate) fn remap_state(&mut self, mapping: &std::collections::BTreeMap<String, String>) {
        let old = std::mem::take(&mut self.state);
        for (digest, paths) in old {
            let new_digest = mapping
                .get(&digest)
                .map(|d| d.to_ascii_lowercase())
                .unwrap_or(digest);
            let merged = self.state.entry(new_digest).or_default();
            merged.extend(paths);
            merged.sort_unstable();
            merged.dedup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version() -> Version {
        let created = DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z").unwrap();
        Version::new(created, Some("initial".into()), None)
    }

    const D1: &str = "aaaa";
    const D2: &str = "bbbb";

    #[test]
    fn state_add_and_lookup() {
        let mut v = version();
        v.state_add(D1, "dir/file.txt").unwrap();
        v.state_add(D1, "copy.txt").unwrap();
        assert_eq!(v.digest_of("dir/file.txt"), Some(D1));
        assert_eq!(v.state()[D1], vec!["copy.txt", "dir/file.txt"]);
    }

    #[test]
    fn duplicate_logical_path_rejected_across_digests() {
        let mut v = version();
        v.state_add(D1, "file.txt").unwrap();
        let err = v.state_add(D2, "file.txt").unwrap_err();
        assert!(matches!(err, InventoryError::DuplicateLogicalPath { .. }));
    }

    #[test]
    fn invalid_logical_path_rejected() {
        let mut v = version();
        assert!(v.state_add(D1, "/abs").is_err());
        assert!(v.state_add(D1, "a/../b").is_err());
    }

    #[test]
    fn remove_drops_empty_digest_entry() {
        let mut v = version();
        v.state_add(D1, "only.txt").unwrap();
        let digest = v.state_remove("only.txt").unwrap();
        assert_eq!(digest, D1);
        assert!(v.state().is_empty());
    }

    #[test]
    fn remove_missing_path_fails() {
        let mut v = version();
        assert!(matches!(
            v.state_remove("ghost.txt"),
            Err(InventoryError::LogicalPathNotFound { .. })
        ));
    }

    #[test]
    fn rename_preserves_digest() {
        let mut v = version();
        v.state_add(D1, "old.txt").unwrap();
        v.state_rename("old.txt", "new.txt").unwrap();
        assert_eq!(v.digest_of("new.txt"), Some(D1));
        assert!(!v.contains_logical("old.txt"));
    }

    #[test]
    fn rename_onto_existing_path_fails() {
        let mut v = version();
        v.state_add(D1, "a.txt").unwrap();
        v.state_add(D2, "b.txt").unwrap();
        assert!(matches!(
            v.state_rename("a.txt", "b.txt"),
            Err(InventoryError::DuplicateLogicalPath { .. })
        ));
        // unchanged on failure
        assert_eq!(v.digest_of("a.txt"), Some(D1));
    }

    #[test]
    fn digests_are_lowercased() {
        let mut v = version();
        v.state_add("ABCD", "f.txt").unwrap();
        assert_eq!(v.digest_of("f.txt"), Some("abcd"));
    }
}
