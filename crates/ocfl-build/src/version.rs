use chrono::{DateTime, FixedOffset};
use tracing::debug;

use ocfl_inventory::{Inventory, InventoryError, User, Version};
use ocfl_types::VersionNum;

use crate::error::BuildResult;

/// Content-placement policy for a version under construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildPolicy {
    /// Reference, rather than duplicate, content already present in an
    /// earlier version.
    pub forward_delta: bool,
    /// Reference, rather than duplicate, content repeated within the version
    /// being built.
    pub dedupe: bool,
    /// Start the new version from a deep copy of the previous head's state
    /// instead of empty.
    pub carry_content_forward: bool,
}

impl Default for BuildPolicy {
    fn default() -> Self {
        Self {
            forward_delta: true,
            dedupe: true,
            carry_content_forward: false,
        }
    }
}

/// What the caller must do with the source bytes after `add_content`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Staging {
    /// Copy the bytes into the object at this content path.
    Copy(String),
    /// Content is already stored; only a state reference was recorded.
    Reference,
}

/// Builds one version of an object.
///
/// Owns the inventory while the version is open; [`commit`](Self::commit)
/// appends the version and hands the inventory back. The builder never
/// touches storage — copy decisions surface as [`Staging`] values for the
/// caller to act on.
pub struct VersionBuilder {
    inventory: Inventory,
    vnum: VersionNum,
    version: Version,
    policy: BuildPolicy,
}

impl VersionBuilder {
    /// Open the next version in sequence.
    pub fn new(
        inventory: Inventory,
        created: DateTime<FixedOffset>,
        message: Option<String>,
        user: Option<User>,
        policy: BuildPolicy,
    ) -> BuildResult<Self> {
        let vnum = inventory.next_version_num()?;
        Self::with_num(inventory, vnum, created, message, user, policy)
    }

    /// Open a version with an explicit directory name.
    ///
    /// Used for the first version of a new object, where the caller picks
    /// the zero-padding width; the sequence check still runs at commit.
    pub fn with_num(
        inventory: Inventory,
        vnum: VersionNum,
        created: DateTime<FixedOffset>,
        message: Option<String>,
        user: Option<User>,
        policy: BuildPolicy,
    ) -> BuildResult<Self> {
        let version = match (policy.carry_content_forward, inventory.head_version()) {
            (true, Some(prior)) => Version::carried_forward(created, message, user, prior),
            _ => Version::new(created, message, user),
        };
        Ok(Self {
            inventory,
            vnum,
            version,
            policy,
        })
    }

    /// The directory name of the version being built.
    pub fn version_num(&self) -> VersionNum {
        self.vnum
    }

    /// The inventory as it currently stands (manifest updates included).
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The state of the version being built.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Record a file in the version, deciding copy vs reference.
    ///
    /// Decision table: content new to the object is always copied; content
    /// already in the version being built follows `dedupe`; content only in
    /// earlier versions follows `forward_delta`.
    pub fn add_content(
        &mut self,
        digest: &str,
        logical_path: &str,
        content_path_hint: Option<&str>,
    ) -> BuildResult<Staging> {
        let digest = digest.to_ascii_lowercase();
        if self.version.contains_logical(logical_path) {
            return Err(InventoryError::DuplicateLogicalPath {
                path: logical_path.to_string(),
            }
            .into());
        }

        let current_prefix = format!("{}/", self.vnum);
        let (in_previous, in_current) = match self.inventory.content_paths(&digest) {
            Some(paths) => {
                let current = paths.iter().any(|p| p.starts_with(&current_prefix));
                let previous = paths.iter().any(|p| !p.starts_with(&current_prefix));
                (previous, current)
            }
            None => (false, false),
        };

        let copy = if in_current {
            !self.policy.dedupe
        } else if in_previous {
            !self.policy.forward_delta
        } else {
            true
        };

        if !copy {
            debug!(%digest, logical_path, "referencing existing content");
            self.version.state_add(&digest, logical_path)?;
            return Ok(Staging::Reference);
        }

        if in_previous || in_current {
            // Forced duplicate: the digest is already in the manifest, so
            // add_file would refuse to copy. Stage an extra content path.
            let name = content_path_hint.unwrap_or(logical_path);
            let content_path = self
                .inventory
                .stage_content_path(self.vnum, &digest, name)?;
            self.version.state_add(&digest, logical_path)?;
            debug!(%digest, content_path, "duplicating content by policy");
            return Ok(Staging::Copy(content_path));
        }

        match self.inventory.add_file(
            self.vnum,
            &mut self.version,
            &digest,
            logical_path,
            content_path_hint,
        )? {
            ocfl_inventory::AddOutcome::Staged(path) => {
                debug!(%digest, content_path = %path, "staging new content");
                Ok(Staging::Copy(path))
            }
            // Unreachable: the digest was checked absent above.
            ocfl_inventory::AddOutcome::Reused => Ok(Staging::Reference),
        }
    }

    /// Remove a logical path from the version's state.
    ///
    /// The manifest is never touched: content from earlier versions stays
    /// referenced there even when no state points at it any more.
    pub fn delete(&mut self, logical_path: &str) -> BuildResult<()> {
        self.version.state_remove(logical_path)?;
        Ok(())
    }

    /// Move a logical path to a new name under the same digest.
    pub fn rename(&mut self, old: &str, new: &str) -> BuildResult<()> {
        self.version.state_rename(old, new)?;
        Ok(())
    }

    /// Finalize: append the version to the inventory and return it.
    pub fn commit(mut self) -> BuildResult<Inventory> {
        self.inventory.version_add(self.vnum, self.version)?;
        Ok(self.inventory)
    }
}

#[cfg(test)]
mod tests {
    use ocfl_types::DigestAlgorithm;

    use super::*;

    const DIGEST_A: &str = "aa11";
    const DIGEST_B: &str = "bb22";

    fn created() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z").unwrap()
    }

    fn builder(inventory: Inventory, policy: BuildPolicy) -> VersionBuilder {
        VersionBuilder::new(inventory, created(), Some("msg".into()), None, policy).unwrap()
    }

    fn one_version_object() -> Inventory {
        let inv = Inventory::new("urn:test", DigestAlgorithm::Sha512).unwrap();
        let mut vb = builder(inv, BuildPolicy::default());
        assert_eq!(
            vb.add_content(DIGEST_A, "file.txt", None).unwrap(),
            Staging::Copy("v1/content/file.txt".into())
        );
        vb.commit().unwrap()
    }

    #[test]
    fn new_content_is_always_copied() {
        one_version_object();
    }

    #[test]
    fn forward_delta_references_prior_content() {
        let inv = one_version_object();
        let mut vb = builder(inv, BuildPolicy::default());
        let staging = vb.add_content(DIGEST_A, "same-bytes.txt", None).unwrap();
        assert_eq!(staging, Staging::Reference);
        let inv = vb.commit().unwrap();
        // manifest unchanged
        assert_eq!(
            inv.content_paths(DIGEST_A).unwrap(),
            &vec!["v1/content/file.txt".to_string()]
        );
    }

    #[test]
    fn disabled_forward_delta_duplicates_prior_content() {
        let inv = one_version_object();
        let policy = BuildPolicy {
            forward_delta: false,
            ..BuildPolicy::default()
        };
        let mut vb = builder(inv, policy);
        let staging = vb.add_content(DIGEST_A, "same-bytes.txt", None).unwrap();
        assert_eq!(staging, Staging::Copy("v2/content/same-bytes.txt".into()));
        let inv = vb.commit().unwrap();
        assert_eq!(inv.content_paths(DIGEST_A).unwrap().len(), 2);
    }

    #[test]
    fn dedupe_references_content_within_version() {
        let inv = Inventory::new("urn:test", DigestAlgorithm::Sha512).unwrap();
        let mut vb = builder(inv, BuildPolicy::default());
        vb.add_content(DIGEST_A, "one.txt", None).unwrap();
        let staging = vb.add_content(DIGEST_A, "two.txt", None).unwrap();
        assert_eq!(staging, Staging::Reference);
    }

    #[test]
    fn disabled_dedupe_duplicates_within_version() {
        let inv = Inventory::new("urn:test", DigestAlgorithm::Sha512).unwrap();
        let policy = BuildPolicy {
            dedupe: false,
            ..BuildPolicy::default()
        };
        let mut vb = builder(inv, policy);
        vb.add_content(DIGEST_A, "one.txt", None).unwrap();
        let staging = vb.add_content(DIGEST_A, "two.txt", None).unwrap();
        assert_eq!(staging, Staging::Copy("v1/content/two.txt".into()));
    }

    #[test]
    fn duplicate_logical_path_is_fail_fast() {
        let inv = Inventory::new("urn:test", DigestAlgorithm::Sha512).unwrap();
        let mut vb = builder(inv, BuildPolicy::default());
        vb.add_content(DIGEST_A, "file.txt", None).unwrap();
        assert!(vb.add_content(DIGEST_B, "file.txt", None).is_err());
    }

    #[test]
    fn delete_leaves_manifest_alone() {
        let inv = one_version_object();
        let policy = BuildPolicy {
            carry_content_forward: true,
            ..BuildPolicy::default()
        };
        let mut vb = builder(inv, policy);
        vb.delete("file.txt").unwrap();
        assert!(vb.delete("file.txt").is_err()); // already gone
        let inv = vb.commit().unwrap();
        assert!(inv.version("v2".parse().unwrap()).unwrap().state().is_empty());
        assert!(inv.has_digest(DIGEST_A)); // dangling manifest entry is valid
    }

    #[test]
    fn rename_moves_logical_path() {
        let inv = one_version_object();
        let policy = BuildPolicy {
            carry_content_forward: true,
            ..BuildPolicy::default()
        };
        let mut vb = builder(inv, policy);
        vb.rename("file.txt", "moved.txt").unwrap();
        assert!(vb.rename("ghost.txt", "x.txt").is_err());
        let inv = vb.commit().unwrap();
        let v2 = inv.version("v2".parse().unwrap()).unwrap();
        assert_eq!(v2.digest_of("moved.txt"), Some(DIGEST_A));
    }

    #[test]
    fn carry_content_forward_copies_head_state() {
        let inv = one_version_object();
        let policy = BuildPolicy {
            carry_content_forward: true,
            ..BuildPolicy::default()
        };
        let vb = builder(inv, policy);
        assert!(vb.version().contains_logical("file.txt"));
        let inv = vb.commit().unwrap();
        assert_eq!(inv.head(), Some("v2".parse().unwrap()));
    }

    #[test]
    fn empty_start_without_carry() {
        let inv = one_version_object();
        let vb = builder(inv, BuildPolicy::default());
        assert!(vb.version().state().is_empty());
    }
}
