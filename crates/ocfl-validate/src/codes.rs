//! The closed catalog of validation checks.
//!
//! Each check has a canonical wire code matching `[EW]\d{3}[a-z]?`. The core
//! treats codes as opaque identifiers; human-readable text is rendered by an
//! external message catalog keyed on these strings.

use std::fmt;

/// Diagnostic severity. Warnings never fail validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Every distinct validation check, as a closed enum so handling is
/// exhaustive. `E`-prefixed codes are errors, `W`-prefixed codes warnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidationCode {
    // --- object root ---------------------------------------------------
    /// Unexpected file in the object root.
    ExtraRootFile,
    /// No object declaration file.
    DeclarationMissing,
    /// More than one object declaration file.
    DeclarationMultiple,
    /// Declaration content does not match its name.
    DeclarationInvalid,
    /// Root `inventory.json` is missing.
    InventoryMissing,
    /// An inventory file is not parseable JSON.
    InventoryUnparseable,

    // --- inventory top level --------------------------------------------
    /// `id` key missing.
    IdMissing,
    /// `id` present but not a non-empty string.
    IdInvalid,
    /// `id` is not URI-shaped.
    IdNotUri,
    /// `type` key missing.
    TypeMissing,
    /// `type` does not name a supported spec version.
    TypeUnknown,
    /// `digestAlgorithm` key missing.
    DigestAlgorithmMissing,
    /// `digestAlgorithm` unknown or not allowed as primary.
    DigestAlgorithmNotAllowed,
    /// `digestAlgorithm` is sha256 (legal but discouraged).
    DigestAlgorithmDiscouraged,
    /// `contentDirectory` empty, `.`, `..`, or contains a separator.
    ContentDirectoryInvalid,
    /// `head` key missing.
    HeadMissing,
    /// `head` does not name the last version in sequence.
    HeadMismatch,

    // --- manifest ---------------------------------------------------------
    /// `manifest` key missing or not an object.
    ManifestMissing,
    /// Manifest key does not match the digest format.
    ManifestDigestMalformed,
    /// Content path malformed or not rooted in a version content directory.
    ContentPathInvalid,
    /// Content path bound to more than one digest.
    ContentPathDuplicate,

    // --- version sequence ---------------------------------------------------
    /// `versions` key missing or not an object.
    VersionsMissing,
    /// Gap in the version sequence.
    VersionSequenceGap,
    /// Version directory outside the detected sequence.
    VersionOutOfSequence,
    /// Zero-padded version numbers in use.
    ZeroPaddedVersions,

    // --- version blocks ---------------------------------------------------
    /// Version value is not an object.
    VersionNotObject,
    /// `created` missing or not a string.
    CreatedMissing,
    /// `created` not parseable as an ISO-8601 timestamp.
    CreatedUnparseable,
    /// `created` lacks an explicit timezone.
    CreatedNoTimezone,
    /// `created` lacks second-level precision.
    CreatedNotToSeconds,
    /// `message` present but not a string.
    MessageInvalid,
    /// `message` absent.
    MessageAbsent,
    /// `user` absent.
    UserAbsent,
    /// `user` present but not an object.
    UserNotObject,
    /// `user.name` missing or not a string.
    UserNameMissing,
    /// `user.address` present but not a string.
    UserAddressInvalid,
    /// `user.address` absent.
    UserAddressAbsent,

    // --- state blocks ---------------------------------------------------
    /// `state` missing or not an object.
    StateMissing,
    /// State key does not match the digest format.
    StateDigestMalformed,
    /// State value is not a non-empty list of strings.
    StatePathsInvalid,
    /// Logical path syntactically invalid.
    LogicalPathInvalid,
    /// Logical path repeated within one version.
    LogicalPathDuplicate,
    /// State references a digest absent from the manifest.
    StateDigestNotInManifest,
    /// Manifest digest never referenced by any version state.
    ManifestDigestUnused,
    /// `fixity` block malformed.
    FixityInvalid,

    // --- sidecar / content ------------------------------------------------
    /// Inventory sidecar file missing.
    SidecarMissing,
    /// Sidecar content malformed.
    SidecarMalformed,
    /// Inventory digest does not match its sidecar.
    InventoryDigestMismatch,
    /// Head version's inventory copy differs from the root inventory.
    InventoryCopyDivergent,
    /// Manifest content path missing on storage.
    ContentFileMissing,
    /// Content file digest does not match its manifest key.
    ContentDigestMismatch,
    /// Content file digest does not match a fixity entry.
    FixityDigestMismatch,
    /// Version directory on storage not listed in the inventory, or listed
    /// but absent on storage.
    VersionDirectoryMismatch,
    /// File under a version directory not claimed by the manifest.
    ExtraVersionFile,

    // --- cross-version ------------------------------------------------------
    /// A version validated in the prior inventory is gone from the current.
    PriorVersionMissing,
    /// A content path from the prior inventory is gone from the current.
    PriorContentPathMissing,
    /// Logical-to-content mapping differs for a shared version.
    VersionStateDivergent,
    /// Shared-version metadata (created/message/user) differs.
    VersionMetaDivergent,
}

impl ValidationCode {
    /// Canonical wire code (`[EW]\d{3}[a-z]?`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtraRootFile => "E001",
            Self::DeclarationMissing => "E003a",
            Self::DeclarationMultiple => "E003b",
            Self::DeclarationInvalid => "E007",
            Self::InventoryMissing => "E063",
            Self::InventoryUnparseable => "E033",
            Self::IdMissing => "E036a",
            Self::IdInvalid => "E037",
            Self::IdNotUri => "W005",
            Self::TypeMissing => "E036b",
            Self::TypeUnknown => "E038",
            Self::DigestAlgorithmMissing => "E036c",
            Self::DigestAlgorithmNotAllowed => "E025",
            Self::DigestAlgorithmDiscouraged => "W004",
            Self::ContentDirectoryInvalid => "E017",
            Self::HeadMissing => "E036d",
            Self::HeadMismatch => "E040",
            Self::ManifestMissing => "E041",
            Self::ManifestDigestMalformed => "E096",
            Self::ContentPathInvalid => "E100",
            Self::ContentPathDuplicate => "E101",
            Self::VersionsMissing => "E043",
            Self::VersionSequenceGap => "E010",
            Self::VersionOutOfSequence => "E011",
            Self::ZeroPaddedVersions => "W001",
            Self::VersionNotObject => "E047",
            Self::CreatedMissing => "E048",
            Self::CreatedUnparseable => "E049",
            Self::CreatedNoTimezone => "W049a",
            Self::CreatedNotToSeconds => "W049b",
            Self::MessageInvalid => "E094",
            Self::MessageAbsent => "W007a",
            Self::UserAbsent => "W007b",
            Self::UserNotObject => "E054a",
            Self::UserNameMissing => "E054b",
            Self::UserAddressInvalid => "E054c",
            Self::UserAddressAbsent => "W008",
            Self::StateMissing => "E050a",
            Self::StateDigestMalformed => "E050b",
            Self::StatePathsInvalid => "E050c",
            Self::LogicalPathInvalid => "E052",
            Self::LogicalPathDuplicate => "E095",
            Self::StateDigestNotInManifest => "E050d",
            Self::ManifestDigestUnused => "E107",
            Self::FixityInvalid => "E111",
            Self::SidecarMissing => "E058",
            Self::SidecarMalformed => "E061",
            Self::InventoryDigestMismatch => "E060",
            Self::InventoryCopyDivergent => "E064",
            Self::ContentFileMissing => "E092a",
            Self::ContentDigestMismatch => "E092b",
            Self::FixityDigestMismatch => "E093",
            Self::VersionDirectoryMismatch => "E046",
            Self::ExtraVersionFile => "E023",
            Self::PriorVersionMissing => "E066a",
            Self::PriorContentPathMissing => "E066b",
            Self::VersionStateDivergent => "E066c",
            Self::VersionMetaDivergent => "W011",
        }
    }

    /// Severity is determined by the code prefix.
    pub fn severity(&self) -> Severity {
        if self.as_str().starts_with('E') {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [ValidationCode; 8] = [
        ValidationCode::DeclarationMissing,
        ValidationCode::IdNotUri,
        ValidationCode::ZeroPaddedVersions,
        ValidationCode::CreatedNoTimezone,
        ValidationCode::ContentDigestMismatch,
        ValidationCode::VersionMetaDivergent,
        ValidationCode::HeadMismatch,
        ValidationCode::StateDigestNotInManifest,
    ];

    #[test]
    fn codes_match_wire_format() {
        for code in SAMPLE {
            let s = code.as_str();
            let mut chars = s.chars();
            let prefix = chars.next().unwrap();
            assert!(prefix == 'E' || prefix == 'W', "{s}");
            let digits: String = chars.by_ref().take(3).collect();
            assert!(digits.chars().all(|c| c.is_ascii_digit()), "{s}");
            let rest: String = chars.collect();
            assert!(rest.is_empty() || (rest.len() == 1 && rest.chars().all(|c| c.is_ascii_lowercase())), "{s}");
        }
    }

    #[test]
    fn severity_follows_prefix() {
        assert_eq!(
            ValidationCode::DeclarationMissing.severity(),
            Severity::Error
        );
        assert_eq!(ValidationCode::IdNotUri.severity(), Severity::Warning);
        assert_eq!(
            ValidationCode::CreatedNoTimezone.severity(),
            Severity::Warning
        );
    }
}
