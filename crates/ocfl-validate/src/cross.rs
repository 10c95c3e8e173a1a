//! Cross-inventory immutability checks.
//!
//! Every version directory carries the inventory as it stood when that
//! version was committed. History already written must never change, so each
//! earlier inventory is compared against the one that superseded it: versions
//! may only be added, manifest entries may only be added, and the state of a
//! shared version must describe the same content.

use std::collections::BTreeSet;

use crate::codes::ValidationCode;
use crate::report::{Diagnostic, DiagnosticLog};
use crate::structural::StructuralReport;

/// Compare a prior inventory against the one that superseded it.
///
/// Diagnostics go to `log`; nothing here aborts.
pub fn compare_inventories(
    prior: &StructuralReport,
    current: &StructuralReport,
    log: &mut DiagnosticLog,
) {
    let current_dirs: BTreeSet<&str> = current.version_dirs.iter().map(String::as_str).collect();

    for version in &prior.version_dirs {
        if !current_dirs.contains(version.as_str()) {
            log.log(
                Diagnostic::new(ValidationCode::PriorVersionMissing).with("version", version),
            );
        }
    }

    for path in prior.manifest_by_path.keys() {
        if !current.manifest_by_path.contains_key(path) {
            log.log(Diagnostic::new(ValidationCode::PriorContentPathMissing).with("path", path));
        }
    }

    for version in prior.version_dirs.iter().filter(|v| current_dirs.contains(v.as_str())) {
        compare_states(prior, current, version, log);
        compare_meta(prior, current, version, log);
    }
}

/// States are compared by resolving each logical path through its own
/// inventory's manifest to content paths. Comparing content paths rather
/// than digests keeps a digest-algorithm migration from reading as a state
/// change.
fn compare_states(
    prior: &StructuralReport,
    current: &StructuralReport,
    version: &str,
    log: &mut DiagnosticLog,
) {
    let empty = Default::default();
    let prior_state = prior.logical_maps.get(version).unwrap_or(&empty);
    let current_state = current.logical_maps.get(version).unwrap_or(&empty);

    let logical_paths: BTreeSet<&String> =
        prior_state.keys().chain(current_state.keys()).collect();

    for path in logical_paths {
        let before = resolve(prior, prior_state.get(path.as_str()));
        let after = resolve(current, current_state.get(path.as_str()));
        if before != after {
            log.log(
                Diagnostic::new(ValidationCode::VersionStateDivergent)
                    .with("path", path.as_str())
                    .with("version", version),
            );
        }
    }
}

fn resolve(report: &StructuralReport, digest: Option<&String>) -> Option<Vec<String>> {
    let digest = digest?;
    report.manifest.get(digest).map(|paths| {
        let mut paths = paths.clone();
        paths.sort();
        paths
    })
}

fn compare_meta(
    prior: &StructuralReport,
    current: &StructuralReport,
    version: &str,
    log: &mut DiagnosticLog,
) {
    if prior.version_meta.get(version) != current.version_meta.get(version) {
        log.log(Diagnostic::new(ValidationCode::VersionMetaDivergent).with("version", version));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ValidationOptions;
    use crate::structural::validate_inventory;
    use serde_json::{json, Value};

    fn two_version_doc() -> Value {
        json!({
            "id": "urn:example:obj",
            "type": "https://ocfl.io/1.1/spec/#inventory",
            "digestAlgorithm": "sha512",
            "head": "v2",
            "manifest": {
                ("a".repeat(128)): ["v1/content/file.txt"],
                ("b".repeat(128)): ["v2/content/extra.txt"]
            },
            "versions": {
                "v1": {
                    "created": "2024-03-01T12:00:00Z",
                    "message": "one",
                    "user": {"name": "alice", "address": "mailto:alice@example.org"},
                    "state": { ("a".repeat(128)): ["file.txt"] }
                },
                "v2": {
                    "created": "2024-03-02T12:00:00Z",
                    "message": "two",
                    "user": {"name": "alice", "address": "mailto:alice@example.org"},
                    "state": {
                        ("a".repeat(128)): ["file.txt"],
                        ("b".repeat(128)): ["extra.txt"]
                    }
                }
            }
        })
    }

    fn one_version_doc() -> Value {
        json!({
            "id": "urn:example:obj",
            "type": "https://ocfl.io/1.1/spec/#inventory",
            "digestAlgorithm": "sha512",
            "head": "v1",
            "manifest": { ("a".repeat(128)): ["v1/content/file.txt"] },
            "versions": {
                "v1": {
                    "created": "2024-03-01T12:00:00Z",
                    "message": "one",
                    "user": {"name": "alice", "address": "mailto:alice@example.org"},
                    "state": { ("a".repeat(128)): ["file.txt"] }
                }
            }
        })
    }

    fn report(doc: &Value) -> crate::structural::StructuralReport {
        validate_inventory(doc, &ValidationOptions::default()).unwrap()
    }

    #[test]
    fn superset_history_is_clean() {
        let prior = report(&one_version_doc());
        let current = report(&two_version_doc());
        let mut log = DiagnosticLog::default();
        compare_inventories(&prior, &current, &mut log);
        assert!(log.passed(), "{:?}", log.diagnostics());
        assert_eq!(log.warning_count(), 0);
    }

    #[test]
    fn dropped_version_is_flagged() {
        let prior = report(&two_version_doc());
        let current = report(&one_version_doc());
        let mut log = DiagnosticLog::default();
        compare_inventories(&prior, &current, &mut log);
        assert!(log.has_code(ValidationCode::PriorVersionMissing));
        assert!(log.has_code(ValidationCode::PriorContentPathMissing));
    }

    #[test]
    fn rewritten_state_is_flagged() {
        let prior = report(&one_version_doc());
        let mut doc = two_version_doc();
        doc["versions"]["v1"]["state"] = json!({ ("b".repeat(128)): ["file.txt"] });
        let current = report(&doc);
        let mut log = DiagnosticLog::default();
        compare_inventories(&prior, &current, &mut log);
        assert!(log.has_code(ValidationCode::VersionStateDivergent));
    }

    #[test]
    fn algorithm_migration_does_not_read_as_divergence() {
        // Same logical layout, digests rewritten under a new algorithm. The
        // manifest still maps whatever digest v1 uses to the same content
        // path, so resolution through content paths stays equal.
        let prior = report(&one_version_doc());
        let mut doc = one_version_doc();
        doc["digestAlgorithm"] = json!("sha256");
        doc["manifest"] = json!({ ("c".repeat(64)): ["v1/content/file.txt"] });
        doc["versions"]["v1"]["state"] = json!({ ("c".repeat(64)): ["file.txt"] });
        let current = report(&doc);
        let mut log = DiagnosticLog::default();
        compare_inventories(&prior, &current, &mut log);
        assert!(!log.has_code(ValidationCode::VersionStateDivergent));
    }

    #[test]
    fn changed_metadata_warns() {
        let prior = report(&one_version_doc());
        let mut doc = two_version_doc();
        doc["versions"]["v1"]["message"] = json!("rewritten");
        let current = report(&doc);
        let mut log = DiagnosticLog::default();
        compare_inventories(&prior, &current, &mut log);
        assert!(log.passed());
        assert!(log.has_code(ValidationCode::VersionMetaDivergent));
    }
}
