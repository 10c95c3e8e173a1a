use std::collections::{BTreeMap, BTreeSet};

use crate::codes::{Severity, ValidationCode};

/// Options shared by all validation entry points.
#[derive(Clone, Debug, Default)]
pub struct ValidationOptions {
    /// Accept any registered digest algorithm as primary, not just
    /// sha512/sha256.
    pub lax_digests: bool,
    /// Soft cap on *stored* diagnostics. Checks keep running and pass/fail
    /// reflects the full set; only the retained message list is bounded.
    pub max_diagnostics: Option<usize>,
}

/// One validation finding: an opaque wire code plus named parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: ValidationCode,
    pub severity: Severity,
    pub params: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(code: ValidationCode) -> Self {
        Self {
            code,
            severity: code.severity(),
            params: BTreeMap::new(),
        }
    }

    /// Attach a named parameter.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)?;
        for (key, value) in &self.params {
            write!(f, " {key}={value:?}")?;
        }
        Ok(())
    }
}

/// Accumulating diagnostics sink.
///
/// Counters always reflect every finding; the stored list is bounded by
/// `max_diagnostics` when set, so a flood of findings cannot exhaust memory
/// while still producing a correct pass/fail answer.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    max_stored: Option<usize>,
}

impl DiagnosticLog {
    pub fn new(max_stored: Option<usize>) -> Self {
        Self {
            max_stored,
            ..Self::default()
        }
    }

    /// Record a finding.
    pub fn log(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        if self.max_stored.map_or(true, |cap| self.diagnostics.len() < cap) {
            self.diagnostics.push(diagnostic);
        }
    }

    /// Record a finding by code with no parameters.
    pub fn code(&mut self, code: ValidationCode) {
        self.log(Diagnostic::new(code));
    }

    /// Fold another log into this one, preserving full counts.
    pub fn merge(&mut self, other: DiagnosticLog) {
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        for diagnostic in other.diagnostics {
            if self.max_stored.map_or(true, |cap| self.diagnostics.len() < cap) {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    /// Stored diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The distinct codes seen (stored diagnostics only).
    pub fn code_set(&self) -> BTreeSet<ValidationCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    /// Total error-severity findings, stored or not.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Total warning-severity findings, stored or not.
    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// `true` when the stored list was truncated by the soft cap.
    pub fn truncated(&self) -> bool {
        self.diagnostics.len() < self.error_count + self.warning_count
    }

    /// `true` when no error-severity finding was recorded.
    pub fn passed(&self) -> bool {
        self.error_count == 0
    }

    /// `true` when any finding with this code was stored.
    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail() {
        let mut log = DiagnosticLog::default();
        log.code(ValidationCode::IdNotUri);
        log.code(ValidationCode::ZeroPaddedVersions);
        assert!(log.passed());
        assert_eq!(log.warning_count(), 2);
    }

    #[test]
    fn errors_fail() {
        let mut log = DiagnosticLog::default();
        log.code(ValidationCode::HeadMismatch);
        assert!(!log.passed());
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn soft_cap_bounds_storage_not_counts() {
        let mut log = DiagnosticLog::new(Some(2));
        for _ in 0..5 {
            log.code(ValidationCode::ContentFileMissing);
        }
        assert_eq!(log.diagnostics().len(), 2);
        assert_eq!(log.error_count(), 5);
        assert!(log.truncated());
        assert!(!log.passed());
    }

    #[test]
    fn merge_preserves_counts_past_cap() {
        let mut a = DiagnosticLog::new(Some(1));
        a.code(ValidationCode::HeadMismatch);
        let mut b = DiagnosticLog::default();
        b.code(ValidationCode::InventoryMissing);
        a.merge(b);
        assert_eq!(a.error_count(), 2);
        assert_eq!(a.diagnostics().len(), 1);
    }

    #[test]
    fn diagnostic_params_render() {
        let d = Diagnostic::new(ValidationCode::VersionSequenceGap).with("missing", "v2");
        assert_eq!(d.to_string(), "E010 missing=\"v2\"");
    }
}
