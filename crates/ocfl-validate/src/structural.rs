//! Single-inventory validation.
//!
//! [`validate_inventory`] checks one parsed inventory document against every
//! syntactic and semantic rule that can be decided without touching storage,
//! accumulating diagnostics instead of stopping at the first violation. The
//! returned [`StructuralReport`] carries whatever was parseable so callers
//! can continue with content and cross-inventory checks even when the
//! document is partially broken.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use ocfl_digest::{is_valid_hex, parse_algorithm};
use ocfl_inventory::DEFAULT_CONTENT_DIRECTORY;
use ocfl_types::{
    paths::{validate_content_directory, validate_logical_path},
    DigestAlgorithm, SpecVersion,
};

use crate::codes::ValidationCode;
use crate::error::{ValidateError, ValidateResult};
use crate::report::{Diagnostic, DiagnosticLog, ValidationOptions};

/// Everything learned from one inventory document.
///
/// Fields hold the best-effort parse: anything the document got wrong is
/// reported in `log` and left empty or `None` here.
#[derive(Debug)]
pub struct StructuralReport {
    pub log: DiagnosticLog,
    pub id: Option<String>,
    pub spec_version: Option<SpecVersion>,
    pub digest_algorithm: Option<DigestAlgorithm>,
    pub content_directory: String,
    /// Raw `head` value, when it was a string.
    pub head: Option<String>,
    /// Version directory names forming a contiguous sequence from v1.
    pub version_dirs: Vec<String>,
    /// Manifest, digest (lowercased) to content paths.
    pub manifest: BTreeMap<String, Vec<String>>,
    /// Reverse manifest, content path to digest (lowercased).
    pub manifest_by_path: BTreeMap<String, String>,
    /// Per version, logical path to state digest (lowercased).
    pub logical_maps: BTreeMap<String, BTreeMap<String, String>>,
    /// Per version, the `created`/`message`/`user` triple as parsed JSON.
    pub version_meta: BTreeMap<String, Value>,
}

/// Validate one inventory document.
///
/// Returns `Err` only when the document is not a JSON object at all; every
/// other problem becomes a diagnostic in the report's log.
pub fn validate_inventory(
    doc: &Value,
    opts: &ValidationOptions,
) -> ValidateResult<StructuralReport> {
    let inv = doc.as_object().ok_or(ValidateError::NotAnObject)?;
    let mut log = DiagnosticLog::new(opts.max_diagnostics);

    let id = check_id(inv, &mut log);
    let spec_version = check_type(inv, &mut log);
    let digest_algorithm = check_algorithm(inv, opts, &mut log);
    let content_directory = check_content_directory(inv, &mut log);

    let (manifest, manifest_by_path) =
        check_manifest(inv, digest_algorithm, &content_directory, &mut log);

    let mut report = StructuralReport {
        log,
        id,
        spec_version,
        digest_algorithm,
        content_directory,
        head: None,
        version_dirs: Vec::new(),
        manifest,
        manifest_by_path,
        logical_maps: BTreeMap::new(),
        version_meta: BTreeMap::new(),
    };

    check_versions(inv, digest_algorithm, &mut report);
    check_state_manifest_agreement(&mut report);
    check_head(inv, &mut report);
    check_fixity(inv, &mut report.log);

    Ok(report)
}

fn check_id(inv: &serde_json::Map<String, Value>, log: &mut DiagnosticLog) -> Option<String> {
    let Some(value) = inv.get("id") else {
        log.code(ValidationCode::IdMissing);
        return None;
    };
    let Some(id) = value.as_str().filter(|s| !s.is_empty()) else {
        log.code(ValidationCode::IdInvalid);
        return None;
    };
    if !is_uri_shaped(id) {
        log.log(Diagnostic::new(ValidationCode::IdNotUri).with("id", id));
    }
    Some(id.to_string())
}

/// A string is URI-shaped when it starts with `scheme:` per RFC 3986:
/// an ASCII letter followed by letters, digits, `+`, `-`, or `.`.
fn is_uri_shaped(id: &str) -> bool {
    let Some(scheme) = id.split(':').next().filter(|s| s.len() < id.len()) else {
        return false;
    };
    let mut chars = scheme.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn check_type(
    inv: &serde_json::Map<String, Value>,
    log: &mut DiagnosticLog,
) -> Option<SpecVersion> {
    let Some(value) = inv.get("type") else {
        log.code(ValidationCode::TypeMissing);
        return None;
    };
    match value.as_str().map(SpecVersion::from_inventory_type) {
        Some(Ok(spec)) => Some(spec),
        _ => {
            log.log(
                Diagnostic::new(ValidationCode::TypeUnknown).with("type", value.to_string()),
            );
            None
        }
    }
}

fn check_algorithm(
    inv: &serde_json::Map<String, Value>,
    opts: &ValidationOptions,
    log: &mut DiagnosticLog,
) -> Option<DigestAlgorithm> {
    let Some(value) = inv.get("digestAlgorithm") else {
        log.code(ValidationCode::DigestAlgorithmMissing);
        return None;
    };
    let parsed = value.as_str().map(parse_algorithm);
    match parsed {
        Some(Ok(algorithm)) => {
            if algorithm == DigestAlgorithm::Sha256 {
                log.code(ValidationCode::DigestAlgorithmDiscouraged);
            } else if !algorithm.allowed_as_primary() && !opts.lax_digests {
                log.log(
                    Diagnostic::new(ValidationCode::DigestAlgorithmNotAllowed)
                        .with("digestAlgorithm", algorithm.as_str()),
                );
                return None;
            }
            Some(algorithm)
        }
        _ => {
            log.log(
                Diagnostic::new(ValidationCode::DigestAlgorithmNotAllowed)
                    .with("digestAlgorithm", value.to_string()),
            );
            None
        }
    }
}

fn check_content_directory(
    inv: &serde_json::Map<String, Value>,
    log: &mut DiagnosticLog,
) -> String {
    let Some(value) = inv.get("contentDirectory") else {
        return DEFAULT_CONTENT_DIRECTORY.to_string();
    };
    match value.as_str() {
        Some(dir) if validate_content_directory(dir).is_ok() => dir.to_string(),
        _ => {
            log.log(
                Diagnostic::new(ValidationCode::ContentDirectoryInvalid)
                    .with("contentDirectory", value.to_string()),
            );
            DEFAULT_CONTENT_DIRECTORY.to_string()
        }
    }
}

type ManifestMaps = (BTreeMap<String, Vec<String>>, BTreeMap<String, String>);

fn check_manifest(
    inv: &serde_json::Map<String, Value>,
    algorithm: Option<DigestAlgorithm>,
    content_directory: &str,
    log: &mut DiagnosticLog,
) -> ManifestMaps {
    let mut manifest: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_path: BTreeMap<String, String> = BTreeMap::new();

    let Some(block) = inv.get("manifest").and_then(Value::as_object) else {
        log.code(ValidationCode::ManifestMissing);
        return (manifest, by_path);
    };

    for (digest, paths) in block {
        if let Some(algorithm) = algorithm {
            if !is_valid_hex(algorithm, digest) {
                log.log(
                    Diagnostic::new(ValidationCode::ManifestDigestMalformed)
                        .with("digest", digest),
                );
            }
        }
        let digest = digest.to_ascii_lowercase();
        let Some(paths) = paths.as_array() else {
            log.log(Diagnostic::new(ValidationCode::ManifestMissing).with("digest", &digest));
            continue;
        };
        let entry = manifest.entry(digest.clone()).or_default();
        for path in paths {
            let Some(path) = path.as_str() else {
                log.log(
                    Diagnostic::new(ValidationCode::ContentPathInvalid)
                        .with("path", path.to_string()),
                );
                continue;
            };
            if !is_content_path(path, content_directory) {
                log.log(Diagnostic::new(ValidationCode::ContentPathInvalid).with("path", path));
                continue;
            }
            if by_path.insert(path.to_string(), digest.clone()).is_some() {
                log.log(Diagnostic::new(ValidationCode::ContentPathDuplicate).with("path", path));
                continue;
            }
            entry.push(path.to_string());
        }
    }
    (manifest, by_path)
}

/// A content path has the shape `<version>/<contentDirectory>/<rest>` where
/// `<rest>` obeys logical-path segment rules.
fn is_content_path(path: &str, content_directory: &str) -> bool {
    let mut parts = path.splitn(3, '/');
    let version_ok = parts
        .next()
        .map_or(false, |v| parse_version_name(v).is_some());
    let dir_ok = parts.next() == Some(content_directory);
    let rest_ok = parts
        .next()
        .map_or(false, |rest| validate_logical_path(rest).is_ok());
    version_ok && dir_ok && rest_ok
}

/// Parse `vN` into (number, zero-pad width), width 0 meaning unpadded.
pub(crate) fn parse_version_name(name: &str) -> Option<(u64, usize)> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let num: u64 = digits.parse().ok()?;
    if num == 0 {
        return None;
    }
    let width = if digits.starts_with('0') { digits.len() } else { 0 };
    Some((num, width))
}

fn format_version_name(num: u64, width: usize) -> String {
    if width == 0 {
        format!("v{num}")
    } else {
        format!("v{num:0width$}")
    }
}

fn check_versions(
    inv: &serde_json::Map<String, Value>,
    algorithm: Option<DigestAlgorithm>,
    report: &mut StructuralReport,
) {
    let Some(block) = inv.get("versions").and_then(Value::as_object) else {
        report.log.code(ValidationCode::VersionsMissing);
        return;
    };

    // Detect the padding width from the name of the first version, then walk
    // the sequence upward for as long as names are present.
    let width = if block.contains_key("v1") {
        Some(0)
    } else {
        (2..=9).find(|w| block.contains_key(&format_version_name(1, *w)))
    };

    let mut in_sequence = BTreeSet::new();
    match width {
        Some(width) => {
            if width > 0 {
                report.log.code(ValidationCode::ZeroPaddedVersions);
            }
            let mut num = 1;
            loop {
                let name = format_version_name(num, width);
                if !block.contains_key(&name) {
                    break;
                }
                in_sequence.insert(name.clone());
                report.version_dirs.push(name);
                num += 1;
            }
            // Anything left over sits beyond a gap.
            for name in block.keys().filter(|n| !in_sequence.contains(*n)) {
                report.log.log(
                    Diagnostic::new(ValidationCode::VersionSequenceGap)
                        .with("missing", format_version_name(num, width))
                        .with("found", name),
                );
                report.log.log(
                    Diagnostic::new(ValidationCode::VersionOutOfSequence).with("version", name),
                );
            }
        }
        None => {
            report.log.code(ValidationCode::VersionSequenceGap);
        }
    }

    // Block contents are checked for every named version, sequenced or not.
    for (name, version) in block {
        check_version_block(name, version, algorithm, report);
    }
}

fn check_version_block(
    name: &str,
    version: &Value,
    algorithm: Option<DigestAlgorithm>,
    report: &mut StructuralReport,
) {
    let Some(block) = version.as_object() else {
        report
            .log
            .log(Diagnostic::new(ValidationCode::VersionNotObject).with("version", name));
        return;
    };
    let log = &mut report.log;

    check_created(name, block.get("created"), log);

    match block.get("message") {
        None => log.log(Diagnostic::new(ValidationCode::MessageAbsent).with("version", name)),
        Some(Value::String(_)) => {}
        Some(_) => log.log(Diagnostic::new(ValidationCode::MessageInvalid).with("version", name)),
    }

    check_user(name, block.get("user"), log);

    let mut meta = serde_json::Map::new();
    for key in ["created", "message", "user"] {
        if let Some(value) = block.get(key) {
            meta.insert(key.to_string(), value.clone());
        }
    }
    report
        .version_meta
        .insert(name.to_string(), Value::Object(meta));

    let state = check_state(name, block.get("state"), algorithm, &mut report.log);
    report.logical_maps.insert(name.to_string(), state);
}

fn check_created(version: &str, value: Option<&Value>, log: &mut DiagnosticLog) {
    let Some(created) = value.and_then(Value::as_str) else {
        log.log(Diagnostic::new(ValidationCode::CreatedMissing).with("version", version));
        return;
    };
    if DateTime::parse_from_rfc3339(created).is_ok() {
        return;
    }
    // Recognizable but degraded timestamps get warnings, garbage an error.
    let naive_seconds = NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S%.f").is_ok();
    let naive_minutes = NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M").is_ok();
    let zoned_minutes = DateTime::parse_from_str(created, "%Y-%m-%dT%H:%M%:z").is_ok();
    if naive_seconds || naive_minutes {
        log.log(
            Diagnostic::new(ValidationCode::CreatedNoTimezone)
                .with("created", created)
                .with("version", version),
        );
        if naive_minutes {
            log.log(
                Diagnostic::new(ValidationCode::CreatedNotToSeconds)
                    .with("created", created)
                    .with("version", version),
            );
        }
    } else if zoned_minutes {
        log.log(
            Diagnostic::new(ValidationCode::CreatedNotToSeconds)
                .with("created", created)
                .with("version", version),
        );
    } else {
        log.log(
            Diagnostic::new(ValidationCode::CreatedUnparseable)
                .with("created", created)
                .with("version", version),
        );
    }
}

fn check_user(version: &str, value: Option<&Value>, log: &mut DiagnosticLog) {
    let Some(user) = value else {
        log.log(Diagnostic::new(ValidationCode::UserAbsent).with("version", version));
        return;
    };
    let Some(user) = user.as_object() else {
        log.log(Diagnostic::new(ValidationCode::UserNotObject).with("version", version));
        return;
    };
    match user.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        _ => log.log(Diagnostic::new(ValidationCode::UserNameMissing).with("version", version)),
    }
    match user.get("address") {
        None => log.log(Diagnostic::new(ValidationCode::UserAddressAbsent).with("version", version)),
        Some(Value::String(_)) => {}
        Some(_) => {
            log.log(Diagnostic::new(ValidationCode::UserAddressInvalid).with("version", version))
        }
    }
}

fn check_state(
    version: &str,
    value: Option<&Value>,
    algorithm: Option<DigestAlgorithm>,
    log: &mut DiagnosticLog,
) -> BTreeMap<String, String> {
    let mut logical = BTreeMap::new();
    let Some(state) = value.and_then(Value::as_object) else {
        log.log(Diagnostic::new(ValidationCode::StateMissing).with("version", version));
        return logical;
    };

    for (digest, paths) in state {
        if let Some(algorithm) = algorithm {
            if !is_valid_hex(algorithm, digest) {
                log.log(
                    Diagnostic::new(ValidationCode::StateDigestMalformed)
                        .with("digest", digest)
                        .with("version", version),
                );
            }
        }
        let digest = digest.to_ascii_lowercase();
        let Some(paths) = paths.as_array().filter(|p| !p.is_empty()) else {
            log.log(
                Diagnostic::new(ValidationCode::StatePathsInvalid)
                    .with("digest", &digest)
                    .with("version", version),
            );
            continue;
        };
        for path in paths {
            let Some(path) = path.as_str() else {
                log.log(
                    Diagnostic::new(ValidationCode::StatePathsInvalid)
                        .with("digest", &digest)
                        .with("version", version),
                );
                continue;
            };
            if validate_logical_path(path).is_err() {
                log.log(
                    Diagnostic::new(ValidationCode::LogicalPathInvalid)
                        .with("path", path)
                        .with("version", version),
                );
                continue;
            }
            if logical.insert(path.to_string(), digest.clone()).is_some() {
                log.log(
                    Diagnostic::new(ValidationCode::LogicalPathDuplicate)
                        .with("path", path)
                        .with("version", version),
                );
            }
        }
    }
    logical
}

/// Every state digest must resolve through the manifest, and every manifest
/// digest must be referenced by at least one state. Each direction produces
/// at most one diagnostic, listing the offending digests.
fn check_state_manifest_agreement(report: &mut StructuralReport) {
    let referenced: BTreeSet<&String> = report
        .logical_maps
        .values()
        .flat_map(|state| state.values())
        .collect();

    let dangling: Vec<&str> = referenced
        .iter()
        .filter(|d| !report.manifest.contains_key(**d))
        .map(|d| d.as_str())
        .collect();
    if !dangling.is_empty() {
        report.log.log(
            Diagnostic::new(ValidationCode::StateDigestNotInManifest)
                .with("digests", dangling.join(", ")),
        );
    }

    let unused: Vec<&str> = report
        .manifest
        .keys()
        .filter(|d| !referenced.contains(*d))
        .map(String::as_str)
        .collect();
    if !unused.is_empty() {
        report.log.log(
            Diagnostic::new(ValidationCode::ManifestDigestUnused)
                .with("digests", unused.join(", ")),
        );
    }
}

fn check_head(inv: &serde_json::Map<String, Value>, report: &mut StructuralReport) {
    let Some(head) = inv.get("head").and_then(Value::as_str) else {
        report.log.code(ValidationCode::HeadMissing);
        return;
    };
    report.head = Some(head.to_string());
    if let Some(last) = report.version_dirs.last() {
        if head != last {
            report.log.log(
                Diagnostic::new(ValidationCode::HeadMismatch)
                    .with("head", head)
                    .with("expected", last),
            );
        }
    }
}

fn check_fixity(inv: &serde_json::Map<String, Value>, log: &mut DiagnosticLog) {
    let Some(fixity) = inv.get("fixity") else {
        return;
    };
    let Some(fixity) = fixity.as_object() else {
        log.code(ValidationCode::FixityInvalid);
        return;
    };
    for (name, digests) in fixity {
        let Ok(algorithm) = parse_algorithm(name) else {
            log.log(Diagnostic::new(ValidationCode::FixityInvalid).with("algorithm", name));
            continue;
        };
        let Some(digests) = digests.as_object() else {
            log.log(Diagnostic::new(ValidationCode::FixityInvalid).with("algorithm", name));
            continue;
        };
        for (digest, paths) in digests {
            let paths_ok = paths
                .as_array()
                .map_or(false, |p| p.iter().all(Value::is_string));
            if !is_valid_hex(algorithm, digest) || !paths_ok {
                log.log(
                    Diagnostic::new(ValidationCode::FixityInvalid)
                        .with("algorithm", name)
                        .with("digest", digest),
                );
            }
        }
    }
}
