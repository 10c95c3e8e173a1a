//! Whole-object validation against a storage backend.
//!
//! [`ObjectValidator`] walks an object root, checks its layout (declaration,
//! inventories, sidecars, version directories), runs the structural validator
//! over the root inventory and every per-version inventory copy, compares
//! those copies for history rewrites, and verifies every content file against
//! the manifest and fixity digests.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use ocfl_digest::{digest_bytes, digest_reader, parse_algorithm};
use ocfl_inventory::sidecar::{parse_sidecar, sidecar_name, INVENTORY_FILE};
use ocfl_store::{join, namaste, read_to_vec, Storage};

use crate::codes::ValidationCode;
use crate::cross::compare_inventories;
use crate::error::{ValidateError, ValidateResult};
use crate::report::{Diagnostic, DiagnosticLog, ValidationOptions};
use crate::structural::{parse_version_name, validate_inventory, StructuralReport};

/// Directories tolerated without being claimed by the inventory.
const ROOT_EXTRA_DIRS: [&str; 2] = ["extensions", "logs"];
const VERSION_LOG_DIR: &str = "logs";

/// The outcome of validating one object.
#[derive(Debug)]
pub struct ObjectReport {
    /// Object root the validation ran against.
    pub object_root: String,
    /// Object id from the root inventory, when one was readable.
    pub id: Option<String>,
    /// Every diagnostic found, across all layers.
    pub log: DiagnosticLog,
}

impl ObjectReport {
    /// `true` when no error-severity diagnostic was found.
    pub fn passed(&self) -> bool {
        self.log.passed()
    }
}

/// Validates one object at a time against a storage backend.
pub struct ObjectValidator<'a> {
    storage: &'a dyn Storage,
    opts: ValidationOptions,
}

impl<'a> ObjectValidator<'a> {
    pub fn new(storage: &'a dyn Storage, opts: ValidationOptions) -> Self {
        Self { storage, opts }
    }

    /// Validate the object rooted at `root`.
    ///
    /// Returns `Err` only for I/O failures or a root that does not exist;
    /// every spec violation lands in the report.
    pub fn validate_object(&self, root: &str) -> ValidateResult<ObjectReport> {
        let mut log = DiagnosticLog::new(self.opts.max_diagnostics);
        debug!(root, "validating object");

        self.check_declaration(root, &mut log)?;

        let inventory_path = join(root, INVENTORY_FILE);
        if !self.storage.exists(&inventory_path)? {
            log.code(ValidationCode::InventoryMissing);
            return Ok(ObjectReport {
                object_root: root.to_string(),
                id: None,
                log,
            });
        }
        let root_bytes = read_to_vec(self.storage, &inventory_path)?;
        let Some((doc, report)) = self.parse_and_check(&root_bytes, None, &mut log)? else {
            return Ok(ObjectReport {
                object_root: root.to_string(),
                id: None,
                log,
            });
        };

        self.check_sidecar(root, &root_bytes, report.digest_algorithm, None, &mut log)?;
        let disk_versions = self.check_root_layout(root, &report, &mut log)?;
        self.check_version_inventories(root, &root_bytes, &report, &disk_versions, &mut log)?;
        self.check_content(root, &report, &mut log)?;
        self.check_extra_version_files(root, &report, &disk_versions, &mut log)?;
        self.verify_fixity(root, &doc, &mut log)?;

        Ok(ObjectReport {
            object_root: root.to_string(),
            id: report.id,
            log,
        })
    }

    fn check_declaration(&self, root: &str, log: &mut DiagnosticLog) -> ValidateResult<()> {
        let declarations = namaste::find_declarations(self.storage, root)?;
        match declarations.as_slice() {
            [] => log.code(ValidationCode::DeclarationMissing),
            [name] => {
                if !namaste::verify_declaration(self.storage, root, name)? {
                    log.log(Diagnostic::new(ValidationCode::DeclarationInvalid).with("name", name));
                }
            }
            names => log.log(
                Diagnostic::new(ValidationCode::DeclarationMultiple)
                    .with("names", names.join(", ")),
            ),
        }
        Ok(())
    }

    /// Parse inventory bytes and run the structural validator, folding all
    /// findings into `log`. `version` names the version directory the copy
    /// came from, `None` for the root inventory.
    fn parse_and_check(
        &self,
        bytes: &[u8],
        version: Option<&str>,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<Option<(Value, StructuralReport)>> {
        let unparseable = |log: &mut DiagnosticLog| {
            let mut diagnostic = Diagnostic::new(ValidationCode::InventoryUnparseable);
            if let Some(version) = version {
                diagnostic = diagnostic.with("version", version);
            }
            log.log(diagnostic);
        };
        let doc: Value = match serde_json::from_slice(bytes) {
            Ok(doc) => doc,
            Err(_) => {
                unparseable(log);
                return Ok(None);
            }
        };
        match validate_inventory(&doc, &self.opts) {
            Ok(report) => {
                log.merge(report.log.clone());
                Ok(Some((doc, report)))
            }
            Err(ValidateError::NotAnObject) => {
                unparseable(log);
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Verify the inventory sidecar in `dir` against the inventory bytes.
    fn check_sidecar(
        &self,
        dir: &str,
        inventory_bytes: &[u8],
        algorithm: Option<ocfl_types::DigestAlgorithm>,
        version: Option<&str>,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<()> {
        let Some(algorithm) = algorithm else {
            return Ok(());
        };
        let tag = |mut d: Diagnostic| {
            if let Some(version) = version {
                d = d.with("version", version);
            }
            d
        };
        let path = join(dir, &sidecar_name(algorithm));
        if !self.storage.exists(&path)? {
            log.log(tag(Diagnostic::new(ValidationCode::SidecarMissing)));
            return Ok(());
        }
        let content = read_to_vec(self.storage, &path)?;
        let expected = match parse_sidecar(&String::from_utf8_lossy(&content)) {
            Ok(digest) => digest,
            Err(_) => {
                log.log(tag(Diagnostic::new(ValidationCode::SidecarMalformed)));
                return Ok(());
            }
        };
        let actual = digest_bytes(algorithm, inventory_bytes);
        if actual != expected.to_ascii_lowercase() {
            log.log(tag(Diagnostic::new(
                ValidationCode::InventoryDigestMismatch,
            )));
        }
        Ok(())
    }

    /// Scan the object root: classify entries and reconcile version
    /// directories on storage with those the inventory declares.
    fn check_root_layout(
        &self,
        root: &str,
        report: &StructuralReport,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<BTreeSet<String>> {
        let mut disk_versions = BTreeSet::new();
        for entry in self.storage.list(root)? {
            if entry.is_dir {
                if parse_version_name(&entry.name).is_some() {
                    disk_versions.insert(entry.name);
                } else if !ROOT_EXTRA_DIRS.contains(&entry.name.as_str()) {
                    log.log(
                        Diagnostic::new(ValidationCode::ExtraRootFile).with("name", entry.name),
                    );
                }
            } else {
                let expected = entry.name == INVENTORY_FILE
                    || entry.name.starts_with("inventory.json.")
                    || entry.name.starts_with(namaste::OBJECT_DECLARATION_PREFIX);
                if !expected {
                    log.log(
                        Diagnostic::new(ValidationCode::ExtraRootFile).with("name", entry.name),
                    );
                }
            }
        }

        // Every version the inventory names must exist, and the other way
        // around. Dirs beyond the contiguous sequence were already reported
        // against the inventory, so compare against all named versions here.
        let named: BTreeSet<&str> = report
            .version_dirs
            .iter()
            .map(String::as_str)
            .chain(report.logical_maps.keys().map(String::as_str))
            .collect();
        for version in &report.version_dirs {
            if !disk_versions.contains(version) {
                log.log(
                    Diagnostic::new(ValidationCode::VersionDirectoryMismatch)
                        .with("version", version)
                        .with("missing_from", "storage"),
                );
            }
        }
        for version in &disk_versions {
            if !named.contains(version.as_str()) {
                log.log(
                    Diagnostic::new(ValidationCode::VersionDirectoryMismatch)
                        .with("version", version)
                        .with("missing_from", "inventory"),
                );
            }
        }
        Ok(disk_versions)
    }

    /// Check per-version inventory copies: the head copy must be
    /// byte-identical to the root inventory, earlier copies are validated in
    /// full and compared against the root for history rewrites.
    fn check_version_inventories(
        &self,
        root: &str,
        root_bytes: &[u8],
        report: &StructuralReport,
        disk_versions: &BTreeSet<String>,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<()> {
        let head = report.version_dirs.last();
        for version in &report.version_dirs {
            if !disk_versions.contains(version) {
                continue;
            }
            let dir = join(root, version);
            let path = join(&dir, INVENTORY_FILE);
            if !self.storage.exists(&path)? {
                continue;
            }
            let bytes = read_to_vec(self.storage, &path)?;

            if Some(version) == head {
                if bytes != root_bytes {
                    log.log(
                        Diagnostic::new(ValidationCode::InventoryCopyDivergent)
                            .with("version", version),
                    );
                }
                continue;
            }

            let Some((_, prior)) = self.parse_and_check(&bytes, Some(version), log)? else {
                continue;
            };
            self.check_sidecar(&dir, &bytes, prior.digest_algorithm, Some(version), log)?;
            compare_inventories(&prior, report, log);
        }
        Ok(())
    }

    /// Every manifest entry must name an existing file whose digest matches.
    fn check_content(
        &self,
        root: &str,
        report: &StructuralReport,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<()> {
        let Some(algorithm) = report.digest_algorithm else {
            return Ok(());
        };
        for (path, digest) in &report.manifest_by_path {
            let full = join(root, path);
            if !self.storage.exists(&full)? {
                log.log(Diagnostic::new(ValidationCode::ContentFileMissing).with("path", path));
                continue;
            }
            let mut reader = self.storage.open_read(&full)?;
            let actual = digest_reader(algorithm, &mut reader)?;
            if actual != *digest {
                log.log(
                    Diagnostic::new(ValidationCode::ContentDigestMismatch)
                        .with("path", path)
                        .with("expected", digest)
                        .with("computed", actual),
                );
            }
        }
        Ok(())
    }

    /// Files under version directories must all be accounted for: the
    /// inventory copy and its sidecar, log files, and manifest content.
    fn check_extra_version_files(
        &self,
        root: &str,
        report: &StructuralReport,
        disk_versions: &BTreeSet<String>,
        log: &mut DiagnosticLog,
    ) -> ValidateResult<()> {
        let prefix = if root.is_empty() {
            String::new()
        } else {
            format!("{root}/")
        };
        for version in disk_versions {
            let inventory = format!("{version}/{INVENTORY_FILE}");
            let sidecar_prefix = format!("{version}/{INVENTORY_FILE}.");
            let log_prefix = format!("{version}/{VERSION_LOG_DIR}/");
            let content_prefix = format!("{version}/{}/", report.content_directory);

            for file in self.storage.walk_files(&join(root, version))? {
                let rel = file.strip_prefix(&prefix).unwrap_or(&file);
                let claimed = rel == inventory
                    || rel.starts_with(&sidecar_prefix)
                    || rel.starts_with(&log_prefix)
                    || (rel.starts_with(&content_prefix)
                        && report.manifest_by_path.contains_key(rel));
                if !claimed {
                    log.log(
                        Diagnostic::new(ValidationCode::ExtraVersionFile).with("path", rel),
                    );
                }
            }
        }
        Ok(())
    }

    /// Verify content files against every well-formed fixity entry. Block
    /// shape problems were already reported by the structural pass.
    fn verify_fixity(&self, root: &str, doc: &Value, log: &mut DiagnosticLog) -> ValidateResult<()> {
        let Some(fixity) = doc.get("fixity").and_then(Value::as_object) else {
            return Ok(());
        };
        for (name, digests) in fixity {
            let Ok(algorithm) = parse_algorithm(name) else {
                continue;
            };
            let Some(digests) = digests.as_object() else {
                continue;
            };
            for (digest, paths) in digests {
                let paths = paths.as_array().into_iter().flatten();
                for path in paths.filter_map(Value::as_str) {
                    let full = join(root, path);
                    if !self.storage.exists(&full)? {
                        continue;
                    }
                    let mut reader = self.storage.open_read(&full)?;
                    let actual = digest_reader(algorithm, &mut reader)?;
                    if actual != digest.to_ascii_lowercase() {
                        log.log(
                            Diagnostic::new(ValidationCode::FixityDigestMismatch)
                                .with("algorithm", name)
                                .with("path", path)
                                .with("expected", digest.as_str())
                                .with("computed", actual),
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
