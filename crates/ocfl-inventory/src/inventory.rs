use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use ocfl_types::paths::{validate_content_directory, validate_logical_path};
use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNum};

use crate::error::{InventoryError, InventoryResult};
use crate::version::Version;

/// The content directory used when `contentDirectory` is absent.
pub const DEFAULT_CONTENT_DIRECTORY: &str = "content";

/// Outcome of adding a file to a version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The digest was already in the manifest; only a state reference was
    /// recorded. No bytes need to be written.
    Reused,
    /// A new manifest entry was created; the caller must copy the bytes to
    /// the returned content path.
    Staged(String),
}

/// The full versioned-object descriptor.
///
/// Fields are declared in the alphabetical order of their JSON names so
/// serde emits a sorted-key document. Maps are BTree-backed for the same
/// reason. All mutation goes through methods that preserve the OCFL
/// invariants: manifest/state digest agreement, contiguous version
/// sequencing, and global content-path uniqueness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "contentDirectory", skip_serializing_if = "Option::is_none")]
    content_directory: Option<String>,
    #[serde(rename = "digestAlgorithm")]
    digest_algorithm: DigestAlgorithm,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fixity: BTreeMap<DigestAlgorithm, BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    head: Option<VersionNum>,
    id: String,
    manifest: BTreeMap<String, Vec<String>>,
    #[serde(rename = "type")]
    spec_version: SpecVersion,
    versions: BTreeMap<VersionNum, Version>,
}

impl Inventory {
    /// Create an empty inventory for a new object.
    ///
    /// Fails with [`InventoryError::MissingId`] when `id` is empty. The
    /// inventory cannot be serialized until the first version is added.
    pub fn new(id: impl Into<String>, digest_algorithm: DigestAlgorithm) -> InventoryResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(InventoryError::MissingId);
        }
        Ok(Self {
            content_directory: None,
            digest_algorithm,
            fixity: BTreeMap::new(),
            head: None,
            id,
            manifest: BTreeMap::new(),
            spec_version: SpecVersion::V1_1,
            versions: BTreeMap::new(),
        })
    }

    /// Set the spec version (default 1.1).
    pub fn with_spec_version(mut self, spec: SpecVersion) -> Self {
        self.spec_version = spec;
        self
    }

    /// Set a non-default `contentDirectory`. Only valid before the first
    /// version is added, since manifest paths embed the directory name.
    pub fn with_content_directory(mut self, dir: impl Into<String>) -> InventoryResult<Self> {
        let dir = dir.into();
        validate_content_directory(&dir)?;
        if self.head.is_some() {
            return Err(InventoryError::ContentDirectoryLocked);
        }
        self.content_directory = Some(dir);
        Ok(self)
    }

    // --- read side ---------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    /// The effective content directory name.
    pub fn content_directory(&self) -> &str {
        self.content_directory
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_DIRECTORY)
    }

    /// The head version, if any version has been added.
    pub fn head(&self) -> Option<VersionNum> {
        self.head
    }

    /// The manifest: digest -> sorted content paths.
    pub fn manifest(&self) -> &BTreeMap<String, Vec<String>> {
        &self.manifest
    }

    /// The fixity block: algorithm -> digest -> content paths.
    pub fn fixity(&self) -> &BTreeMap<DigestAlgorithm, BTreeMap<String, Vec<String>>> {
        &self.fixity
    }

    /// All versions in numeric order.
    pub fn versions(&self) -> &BTreeMap<VersionNum, Version> {
        &self.versions
    }

    pub fn version(&self, vnum: VersionNum) -> Option<&Version> {
        self.versions.get(&vnum)
    }

    /// The version named by `head`.
    pub fn head_version(&self) -> Option<&Version> {
        self.head.and_then(|h| self.versions.get(&h))
    }

    /// The directory name for the next version in sequence.
    pub fn next_version_num(&self) -> InventoryResult<VersionNum> {
        match self.head {
            Some(h) => Ok(h.next()?),
            None => Ok(VersionNum::V1),
        }
    }

    /// Whether a digest has at least one content path in the manifest.
    pub fn has_digest(&self, digest: &str) -> bool {
        self.manifest.contains_key(&digest.to_ascii_lowercase())
    }

    /// The content paths recorded for a digest.
    pub fn content_paths(&self, digest: &str) -> Option<&Vec<String>> {
        self.manifest.get(&digest.to_ascii_lowercase())
    }

    /// The digest owning a content path, if any.
    pub fn digest_of_content_path(&self, path: &str) -> Option<&str> {
        self.manifest
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(digest, _)| digest.as_str())
    }

    /// The digest a logical path resolves to in a given version.
    pub fn digest_for_logical(&self, vnum: VersionNum, logical_path: &str) -> Option<&str> {
        self.versions.get(&vnum)?.digest_of(logical_path)
    }

    /// All digests referenced by any version's state.
    pub fn referenced_digests(&self) -> BTreeSet<&str> {
        self.versions
            .values()
            .flat_map(|v| v.digests())
            .collect()
    }

    // --- mutation ----------------------------------------------------------

    /// Bind a content path to a digest in the manifest.
    ///
    /// Idempotent for the same digest; fails with
    /// [`InventoryError::ContentPathCollision`] when the path is already
    /// bound to a different digest.
    pub fn manifest_add(&mut self, digest: &str, content_path: &str) -> InventoryResult<()> {
        let digest = digest.to_ascii_lowercase();
        if let Some(existing) = self.digest_of_content_path(content_path) {
            if existing == digest {
                return Ok(());
            }
            return Err(InventoryError::ContentPathCollision {
                path: content_path.to_string(),
                existing: existing.to_string(),
            });
        }
        let paths = self.manifest.entry(digest).or_default();
        paths.push(content_path.to_string());
        paths.sort_unstable();
        Ok(())
    }

    /// Choose a unique content path for new content in `vnum` and record it
    /// in the manifest under `digest`.
    ///
    /// The candidate is `<vnum>/<contentDirectory>/<name>`; collisions with
    /// any existing manifest path get a `__2`, `__3`, ... suffix.
    pub fn stage_content_path(
        &mut self,
        vnum: VersionNum,
        digest: &str,
        name: &str,
    ) -> InventoryResult<String> {
        validate_logical_path(name)?;
        let candidate = format!("{vnum}/{}/{name}", self.content_directory());
        let mut chosen = candidate.clone();
        let mut suffix = 2u64;
        while self.digest_of_content_path(&chosen).is_some() {
            chosen = format!("{candidate}__{suffix}");
            suffix += 1;
        }
        self.manifest_add(digest, &chosen)?;
        Ok(chosen)
    }

    /// Add a file to a version being built.
    ///
    /// When the digest already has content in the manifest, only the state
    /// reference is recorded ([`AddOutcome::Reused`]). Otherwise a content
    /// path is chosen from `hint` (falling back to the logical path), the
    /// manifest is updated, and the caller must copy the bytes to the
    /// returned path ([`AddOutcome::Staged`]).
    pub fn add_file(
        &mut self,
        vnum: VersionNum,
        version: &mut Version,
        digest: &str,
        logical_path: &str,
        content_path_hint: Option<&str>,
    ) -> InventoryResult<AddOutcome> {
        validate_logical_path(logical_path)?;
        if version.contains_logical(logical_path) {
            return Err(InventoryError::DuplicateLogicalPath {
                path: logical_path.to_string(),
            });
        }
        let digest = digest.to_ascii_lowercase();
        if self.manifest.contains_key(&digest) {
            version.state_add(&digest, logical_path)?;
            return Ok(AddOutcome::Reused);
        }
        let name = content_path_hint.unwrap_or(logical_path);
        let content_path = self.stage_content_path(vnum, &digest, name)?;
        version.state_add(&digest, logical_path)?;
        Ok(AddOutcome::Staged(content_path))
    }

    /// Append a completed version and advance `head`.
    ///
    /// `vnum` must be exactly the next version in sequence, and every digest
    /// in the version's state must already be in the manifest.
    pub fn version_add(&mut self, vnum: VersionNum, version: Version) -> InventoryResult<()> {
        let expected = match self.head {
            Some(h) => h.next()?,
            // Any padding width is acceptable for the first version; the
            // width chosen here fixes it for the rest of the object.
            None if vnum.number() == 1 => vnum,
            None => VersionNum::V1,
        };
        if vnum != expected {
            return Err(InventoryError::NonSequentialVersion {
                expected,
                got: vnum,
            });
        }
        for digest in version.digests() {
            if !self.manifest.contains_key(digest) {
                return Err(InventoryError::DanglingStateDigest {
                    version: vnum,
                    digest: digest.to_string(),
                });
            }
        }
        self.versions.insert(vnum, version);
        self.head = Some(vnum);
        Ok(())
    }

    /// Record a supplementary fixity digest for a content path.
    pub fn fixity_add(
        &mut self,
        algorithm: DigestAlgorithm,
        digest: &str,
        content_path: &str,
    ) {
        let paths = self
            .fixity
            .entry(algorithm)
            .or_default()
            .entry(digest.to_ascii_lowercase())
            .or_default();
        if !paths.iter().any(|p| p == content_path) {
            paths.push(content_path.to_string());
            paths.sort_unstable();
        }
    }

    /// Rewrite every digest in the inventory under a new algorithm.
    ///
    /// `mapping` takes each current manifest digest to its value under
    /// `new_algorithm`; every manifest key must be covered. The old
    /// algorithm's manifest moves into the fixity block so consumers of the
    /// previous digests keep working.
    pub fn remap_digests(
        &mut self,
        new_algorithm: DigestAlgorithm,
        mapping: &BTreeMap<String, String>,
    ) -> InventoryResult<()> {
        for digest in self.manifest.keys() {
            if !mapping.contains_key(digest) {
                return Err(InventoryError::DanglingStateDigest {
                    version: self.head.unwrap_or(VersionNum::V1),
                    digest: digest.clone(),
                });
            }
        }

        let old_manifest = std::mem::take(&mut self.manifest);
        let mut new_manifest: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (old_digest, paths) in &old_manifest {
            let new_digest = mapping[old_digest].to_ascii_lowercase();
            let merged = new_manifest.entry(new_digest).or_default();
            merged.extend(paths.iter().cloned());
            merged.sort_unstable();
            merged.dedup();
        }
        self.manifest = new_manifest;

        let mut versions = std::mem::take(&mut self.versions);
        for version in versions.values_mut() {
            version.remap_state(mapping);
        }
        self.versions = versions;

        self.fixity.insert(self.digest_algorithm, old_manifest);
        self.digest_algorithm = new_algorithm;
        Ok(())
    }

    // --- serialization -----------------------------------------------------

    /// Serialize to the canonical JSON form: sorted keys, 2-space indent,
    /// trailing newline.
    pub fn to_json_vec(&self) -> InventoryResult<Vec<u8>> {
        if self.head.is_none() {
            return Err(InventoryError::NoVersions);
        }
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse an inventory document.
    pub fn from_slice(data: &[u8]) -> InventoryResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::version::User;

    const DIGEST_A: &str = "1111aaaa";
    const DIGEST_B: &str = "2222bbbb";

    fn inv() -> Inventory {
        Inventory::new("http://example.org/obj", DigestAlgorithm::Sha512).unwrap()
    }

    fn draft() -> Version {
        Version::new(
            DateTime::parse_from_rfc3339("2024-05-01T09:30:00+02:00").unwrap(),
            Some("test version".into()),
            Some(User::new("alice", Some("mailto:alice@example.org".into()))),
        )
    }

    fn v(s: &str) -> VersionNum {
        s.parse().unwrap()
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(matches!(
            Inventory::new("", DigestAlgorithm::Sha512),
            Err(InventoryError::MissingId)
        ));
    }

    #[test]
    fn add_file_stages_new_content() {
        let mut inv = inv();
        let mut version = draft();
        let outcome = inv
            .add_file(v("v1"), &mut version, DIGEST_A, "dir/file.txt", None)
            .unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Staged("v1/content/dir/file.txt".into())
        );
        assert_eq!(inv.content_paths(DIGEST_A).unwrap().len(), 1);
        assert!(version.contains_logical("dir/file.txt"));
    }

    #[test]
    fn add_file_reuses_known_digest() {
        let mut inv = inv();
        let mut v1 = draft();
        inv.add_file(v("v1"), &mut v1, DIGEST_A, "file.txt", None)
            .unwrap();
        inv.version_add(v("v1"), v1).unwrap();

        let mut v2 = draft();
        let outcome = inv
            .add_file(v("v2"), &mut v2, DIGEST_A, "renamed.txt", None)
            .unwrap();
        assert_eq!(outcome, AddOutcome::Reused);
        // manifest unchanged: still one path under the digest
        assert_eq!(
            inv.content_paths(DIGEST_A).unwrap(),
            &vec!["v1/content/file.txt".to_string()]
        );
    }

    #[test]
    fn add_file_honors_hint_and_disambiguates() {
        let mut inv = inv();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "a.txt", Some("stored.bin"))
            .unwrap();
        // same hint, different digest: collision gets a suffix
        let outcome = inv
            .add_file(v("v1"), &mut version, DIGEST_B, "b.txt", Some("stored.bin"))
            .unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Staged("v1/content/stored.bin__2".into())
        );
    }

    #[test]
    fn duplicate_logical_path_in_version_fails() {
        let mut inv = inv();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "file.txt", None)
            .unwrap();
        assert!(matches!(
            inv.add_file(v("v1"), &mut version, DIGEST_B, "file.txt", None),
            Err(InventoryError::DuplicateLogicalPath { .. })
        ));
    }

    #[test]
    fn manifest_collision_across_digests_fails() {
        let mut inv = inv();
        inv.manifest_add(DIGEST_A, "v1/content/x").unwrap();
        inv.manifest_add(DIGEST_A, "v1/content/x").unwrap(); // idempotent
        assert!(matches!(
            inv.manifest_add(DIGEST_B, "v1/content/x"),
            Err(InventoryError::ContentPathCollision { .. })
        ));
    }

    #[test]
    fn version_sequence_is_enforced() {
        let mut inv = inv();
        let err = inv.version_add(v("v2"), draft()).unwrap_err();
        assert!(matches!(err, InventoryError::NonSequentialVersion { .. }));

        inv.version_add(v("v1"), draft()).unwrap();
        assert_eq!(inv.head(), Some(v("v1")));
        assert!(inv.version_add(v("v3"), draft()).is_err());
        inv.version_add(v("v2"), draft()).unwrap();
        assert_eq!(inv.head(), Some(v("v2")));
    }

    #[test]
    fn padded_first_version_fixes_width() {
        let mut inv = inv();
        inv.version_add(v("v0001"), draft()).unwrap();
        assert_eq!(inv.next_version_num().unwrap(), v("v0002"));
    }

    #[test]
    fn dangling_state_digest_rejected() {
        let mut inv = inv();
        let mut version = draft();
        version.state_add(DIGEST_A, "ghost.txt").unwrap();
        assert!(matches!(
            inv.version_add(v("v1"), version),
            Err(InventoryError::DanglingStateDigest { .. })
        ));
    }

    #[test]
    fn serialization_requires_a_version() {
        let inv = inv();
        assert!(matches!(inv.to_json_vec(), Err(InventoryError::NoVersions)));
    }

    #[test]
    fn json_roundtrip_preserves_equality() {
        let mut inv = inv();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "a.txt", None)
            .unwrap();
        inv.add_file(v("v1"), &mut version, DIGEST_B, "b/c.txt", None)
            .unwrap();
        inv.version_add(v("v1"), version).unwrap();
        inv.fixity_add(DigestAlgorithm::Md5, "00ff", "v1/content/a.txt");

        let bytes = inv.to_json_vec().unwrap();
        let parsed = Inventory::from_slice(&bytes).unwrap();
        assert_eq!(inv, parsed);
        // canonical form is stable
        assert_eq!(parsed.to_json_vec().unwrap(), bytes);
    }

    #[test]
    fn serialized_key_order_is_sorted() {
        let mut inv = inv();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "a.txt", None)
            .unwrap();
        inv.version_add(v("v1"), version).unwrap();
        let text = String::from_utf8(inv.to_json_vec().unwrap()).unwrap();
        let positions: Vec<_> = ["digestAlgorithm", "head", "id", "manifest", "type", "versions"]
            .iter()
            .map(|k| text.find(&format!("\"{k}\"")).expect(k))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn remap_digests_moves_old_manifest_to_fixity() {
        let mut inv = Inventory::new("id:x", DigestAlgorithm::Sha256).unwrap();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "a.txt", None)
            .unwrap();
        inv.version_add(v("v1"), version).unwrap();

        let mut mapping = BTreeMap::new();
        mapping.insert(DIGEST_A.to_string(), "ffff9999".to_string());
        inv.remap_digests(DigestAlgorithm::Sha512, &mapping).unwrap();

        assert_eq!(inv.digest_algorithm(), DigestAlgorithm::Sha512);
        assert!(inv.has_digest("ffff9999"));
        assert!(!inv.has_digest(DIGEST_A));
        assert_eq!(
            inv.version(v("v1")).unwrap().digest_of("a.txt"),
            Some("ffff9999")
        );
        let old = &inv.fixity()[&DigestAlgorithm::Sha256];
        assert_eq!(old[DIGEST_A], vec!["v1/content/a.txt".to_string()]);
    }

    #[test]
    fn remap_requires_full_mapping() {
        let mut inv = inv();
        let mut version = draft();
        inv.add_file(v("v1"), &mut version, DIGEST_A, "a.txt", None)
            .unwrap();
        inv.version_add(v("v1"), version).unwrap();
        let empty = BTreeMap::new();
        assert!(inv.remap_digests(DigestAlgorithm::Sha512, &empty).is_err());
    }

    #[test]
    fn content_directory_is_used_for_staging() {
        let mut inv = Inventory::new("id:y", DigestAlgorithm::Sha512)
            .unwrap()
            .with_content_directory("data")
            .unwrap();
        let mut version = draft();
        let outcome = inv
            .add_file(v("v1"), &mut version, DIGEST_A, "f.txt", None)
            .unwrap();
        assert_eq!(outcome, AddOutcome::Staged("v1/data/f.txt".into()));
    }
}
