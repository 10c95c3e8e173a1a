use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info};

use ocfl_digest::{digest_bytes, digest_reader};
use ocfl_inventory::sidecar::{format_sidecar, sidecar_name, INVENTORY_FILE};
use ocfl_inventory::{Inventory, User};
use ocfl_store::{join, namaste, read_to_vec, Storage};
use ocfl_types::{DigestAlgorithm, SpecVersion, VersionNum};

use crate::error::{BuildError, BuildResult};
use crate::version::{BuildPolicy, Staging, VersionBuilder};

/// Metadata recorded on a new version.
#[derive(Clone, Debug, Default)]
pub struct VersionMeta {
    /// Creation timestamp; the current time when unset.
    pub created: Option<DateTime<FixedOffset>>,
    pub message: Option<String>,
    pub user: Option<User>,
}

impl VersionMeta {
    fn created_or_now(&self) -> DateTime<FixedOffset> {
        self.created.unwrap_or_else(|| Utc::now().fixed_offset())
    }
}

/// Options for `create` and `build`.
#[derive(Clone, Debug)]
pub struct ObjectOptions {
    /// Object identifier; a URI is recommended.
    pub id: String,
    pub digest_algorithm: DigestAlgorithm,
    pub spec_version: SpecVersion,
    /// Non-default `contentDirectory`, if any.
    pub content_directory: Option<String>,
    /// Total digit width for version directory names; 0 = unpadded (`v1`).
    pub zero_padding_width: usize,
    pub policy: BuildPolicy,
    pub meta: VersionMeta,
}

impl ObjectOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            digest_algorithm: DigestAlgorithm::Sha512,
            spec_version: SpecVersion::V1_1,
            content_directory: None,
            zero_padding_width: 0,
            policy: BuildPolicy::default(),
            meta: VersionMeta::default(),
        }
    }
}

/// Options for `update`.
#[derive(Clone, Debug, Default)]
pub struct UpdateOptions {
    pub policy: BuildPolicy,
    pub meta: VersionMeta,
    /// Migrate the object to a new primary digest algorithm.
    pub digest_algorithm: Option<DigestAlgorithm>,
    /// Additional fixity algorithms to compute for all manifest content.
    pub add_fixity: Vec<DigestAlgorithm>,
}

/// Object-level build orchestration over a [`Storage`] tree.
///
/// Each operation either completes and leaves a consistent object on
/// storage, or fails with a typed error. Writing is not transactional: an
/// interrupted multi-version `build` can leave a partially-written object.
pub struct ObjectBuilder<'a> {
    storage: &'a dyn Storage,
    root: String,
}

impl<'a> ObjectBuilder<'a> {
    pub fn new(storage: &'a dyn Storage, root: impl Into<String>) -> Self {
        Self {
            storage,
            root: root.into(),
        }
    }

    /// Create a new object with a single `v1` built from a source tree.
    pub fn create(&self, source: &dyn Storage, opts: &ObjectOptions) -> BuildResult<Inventory> {
        self.ensure_empty_target()?;

        let vnum = VersionNum::with_width(1, opts.zero_padding_width)?;
        let mut inventory = Inventory::new(&opts.id, opts.digest_algorithm)?
            .with_spec_version(opts.spec_version);
        if let Some(dir) = &opts.content_directory {
            inventory = inventory.with_content_directory(dir.clone())?;
        }

        let mut builder = VersionBuilder::with_num(
            inventory,
            vnum,
            opts.meta.created_or_now(),
            opts.meta.message.clone(),
            opts.meta.user.clone(),
            opts.policy,
        )?;
        let copies = self.add_source_tree(&mut builder, source, "")?;
        let inventory = builder.commit()?;

        namaste::write_declaration(self.storage, &self.root, opts.spec_version)?;
        self.copy_staged(source, &copies)?;
        self.write_inventories(&inventory)?;
        info!(id = %inventory.id(), root = %self.root, "created object");
        Ok(inventory)
    }

    /// Create a new object by replaying `v1..vN` subdirectories of a source
    /// tree, in numeric order, each as the complete state of that version.
    pub fn build(&self, source: &dyn Storage, opts: &ObjectOptions) -> BuildResult<Inventory> {
        self.ensure_empty_target()?;

        let mut dirs: Vec<VersionNum> = source
            .list("")?
            .into_iter()
            .filter(|e| e.is_dir)
            .filter_map(|e| e.name.parse().ok())
            .collect();
        dirs.sort();
        if dirs.is_empty() {
            return Err(BuildError::NoSourceVersions);
        }
        for (index, vnum) in dirs.iter().enumerate() {
            if vnum.number() != (index + 1) as u64 {
                return Err(BuildError::NonContiguousSource {
                    expected: format!("version {}", index + 1),
                    found: vnum.to_string(),
                });
            }
        }

        let mut inventory = Inventory::new(&opts.id, opts.digest_algorithm)?
            .with_spec_version(opts.spec_version);
        if let Some(dir) = &opts.content_directory {
            inventory = inventory.with_content_directory(dir.clone())?;
        }

        let mut all_copies = Vec::new();
        let mut snapshots = Vec::new();
        for vnum in dirs {
            let mut builder = VersionBuilder::with_num(
                inventory,
                vnum,
                opts.meta.created_or_now(),
                opts.meta.message.clone(),
                opts.meta.user.clone(),
                opts.policy,
            )?;
            let prefix = format!("{vnum}/");
            for file in source.walk_files(&vnum.to_string())? {
                let logical = file
                    .strip_prefix(&prefix)
                    .expect("walk stays under the version directory");
                let digest = self.digest_source(source, opts.digest_algorithm, &file)?;
                if let Staging::Copy(content_path) =
                    builder.add_content(&digest, logical, None)?
                {
                    all_copies.push((file.clone(), content_path));
                }
            }
            inventory = builder.commit()?;
            snapshots.push((vnum, inventory.clone()));
        }

        namaste::write_declaration(self.storage, &self.root, opts.spec_version)?;
        self.copy_staged(source, &all_copies)?;
        for (vnum, snapshot) in &snapshots {
            self.write_inventory_at(snapshot, &vnum.to_string())?;
        }
        let (_, final_inventory) = snapshots.pop().expect("at least one version");
        self.write_inventory_at(&final_inventory, "")?;
        info!(id = %final_inventory.id(), head = %final_inventory.head().expect("committed").to_string(), "built object");
        Ok(final_inventory)
    }

    /// Append exactly one new version to an existing, valid object.
    ///
    /// With a source tree, the new version's state is exactly the tree's
    /// content. Without one, the previous state is carried forward — the
    /// no-content-change path used for digest-algorithm migration and fixity
    /// additions.
    pub fn update(
        &self,
        source: Option<&dyn Storage>,
        opts: &UpdateOptions,
    ) -> BuildResult<Inventory> {
        let mut inventory = self.load_inventory()?;

        if let Some(new_algorithm) = opts.digest_algorithm {
            if new_algorithm != inventory.digest_algorithm() {
                inventory = self.migrate_algorithm(inventory, new_algorithm)?;
            }
        }
        for algorithm in &opts.add_fixity {
            if *algorithm == inventory.digest_algorithm() {
                continue;
            }
            self.compute_fixity(&mut inventory, *algorithm)?;
        }

        let policy = BuildPolicy {
            forward_delta: opts.policy.forward_delta,
            dedupe: opts.policy.dedupe,
            carry_content_forward: source.is_none(),
        };
        let mut builder = VersionBuilder::new(
            inventory,
            opts.meta.created_or_now(),
            opts.meta.message.clone(),
            opts.meta.user.clone(),
            policy,
        )?;
        let mut copies = Vec::new();
        if let Some(src) = source {
            copies = self.add_source_tree(&mut builder, src, "")?;
        }
        let inventory = builder.commit()?;

        if let Some(src) = source {
            self.copy_staged(src, &copies)?;
        }
        self.write_inventories(&inventory)?;
        info!(id = %inventory.id(), head = %inventory.head().expect("committed").to_string(), "updated object");
        Ok(inventory)
    }

    // --- internals ----------------------------------------------------------

    fn add_source_tree(
        &self,
        builder: &mut VersionBuilder,
        source: &dyn Storage,
        dir: &str,
    ) -> BuildResult<Vec<(String, String)>> {
        let algorithm = builder.inventory().digest_algorithm();
        let mut copies = Vec::new();
        for file in source.walk_files(dir)? {
            let digest = self.digest_source(source, algorithm, &file)?;
            if let Staging::Copy(content_path) = builder.add_content(&digest, &file, None)? {
                copies.push((file, content_path));
            }
        }
        Ok(copies)
    }

    fn ensure_empty_target(&self) -> BuildResult<()> {
        if self.storage.exists(&self.root)? && !self.storage.list(&self.root)?.is_empty() {
            return Err(BuildError::ObjectExists {
                root: self.root.clone(),
            });
        }
        Ok(())
    }

    fn digest_source(
        &self,
        source: &dyn Storage,
        algorithm: DigestAlgorithm,
        path: &str,
    ) -> BuildResult<String> {
        let mut reader = source.open_read(path)?;
        Ok(digest_reader(algorithm, &mut reader)?)
    }

    fn copy_staged(
        &self,
        source: &dyn Storage,
        copies: &[(String, String)],
    ) -> BuildResult<()> {
        for (src_path, content_path) in copies {
            let data = read_to_vec(source, src_path)?;
            self.storage.write(&join(&self.root, content_path), &data)?;
            debug!(src = %src_path, dst = %content_path, "copied content");
        }
        Ok(())
    }

    fn load_inventory(&self) -> BuildResult<Inventory> {
        let missing = |reason: &str| BuildError::NotAnObject {
            root: self.root.clone(),
            reason: reason.to_string(),
        };
        if namaste::find_declarations(self.storage, &self.root)
            .map_err(|_| missing("root directory not found"))?
            .is_empty()
        {
            return Err(missing("no object declaration"));
        }
        let path = join(&self.root, INVENTORY_FILE);
        if !self.storage.exists(&path)? {
            return Err(missing("missing inventory.json"));
        }
        Ok(Inventory::from_slice(&read_to_vec(self.storage, &path)?)?)
    }

    fn write_inventories(&self, inventory: &Inventory) -> BuildResult<()> {
        let head = inventory
            .head()
            .ok_or(ocfl_inventory::InventoryError::NoVersions)?;
        self.write_inventory_at(inventory, &head.to_string())?;
        self.write_inventory_at(inventory, "")
    }

    fn write_inventory_at(&self, inventory: &Inventory, subdir: &str) -> BuildResult<()> {
        let bytes = inventory.to_json_vec()?;
        let digest = digest_bytes(inventory.digest_algorithm(), &bytes);
        let dir = join(&self.root, subdir);
        self.storage.write(&join(&dir, INVENTORY_FILE), &bytes)?;
        self.storage.write(
            &join(&dir, &sidecar_name(inventory.digest_algorithm())),
            format_sidecar(&digest).as_bytes(),
        )?;
        Ok(())
    }

    /// Recompute every manifest digest under `new_algorithm` and rewrite the
    /// inventory, moving the old digests into the fixity block.
    fn migrate_algorithm(
        &self,
        mut inventory: Inventory,
        new_algorithm: DigestAlgorithm,
    ) -> BuildResult<Inventory> {
        let mut mapping = BTreeMap::new();
        for (old_digest, paths) in inventory.manifest() {
            let mut agreed: Option<String> = None;
            for path in paths {
                let mut reader = self.storage.open_read(&join(&self.root, path))?;
                let computed = digest_reader(new_algorithm, &mut reader)?;
                match &agreed {
                    None => agreed = Some(computed),
                    Some(expected) if *expected != computed => {
                        return Err(BuildError::AlgorithmMigrationInconsistency {
                            digest: old_digest.clone(),
                            path: path.clone(),
                            expected: expected.clone(),
                            computed,
                        });
                    }
                    _ => {}
                }
            }
            if let Some(new_digest) = agreed {
                mapping.insert(old_digest.clone(), new_digest);
            }
        }
        inventory.remap_digests(new_algorithm, &mapping)?;
        info!(algorithm = %new_algorithm, "migrated digest algorithm");
        Ok(inventory)
    }

    /// Digest every manifest content path under `algorithm` and record the
    /// results in the fixity block.
    fn compute_fixity(
        &self,
        inventory: &mut Inventory,
        algorithm: DigestAlgorithm,
    ) -> BuildResult<()> {
        let manifest = inventory.manifest().clone();
        for paths in manifest.values() {
            for path in paths {
                let mut reader = self.storage.open_read(&join(&self.root, path))?;
                let computed = digest_reader(algorithm, &mut reader)?;
                inventory.fixity_add(algorithm, &computed, path);
            }
        }
        Ok(())
    }
}
