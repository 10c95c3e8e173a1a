use ocfl_types::{TypeError, VersionNum};

/// Errors from inventory mutation and (de)serialization.
///
/// These are the fail-fast building errors: any violated precondition aborts
/// the mutation before the inventory is changed.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The object identifier is missing or empty.
    #[error("object id must not be empty")]
    MissingId,

    /// The logical path is already present in the version's state.
    #[error("logical path {path:?} already exists in this version")]
    DuplicateLogicalPath { path: String },

    /// The logical path is not present in the version's state.
    #[error("logical path {path:?} not found in this version")]
    LogicalPathNotFound { path: String },

    /// A content path is already bound to a different digest.
    #[error("content path {path:?} is already used by digest {existing}")]
    ContentPathCollision { path: String, existing: String },

    /// Versions must be appended in sequence.
    #[error("expected version {expected}, got {got}")]
    NonSequentialVersion {
        expected: VersionNum,
        got: VersionNum,
    },

    /// A version state references a digest absent from the manifest.
    #[error("version {version} state references digest {digest} missing from the manifest")]
    DanglingStateDigest {
        version: VersionNum,
        digest: String,
    },

    /// The inventory has no versions yet and cannot be serialized.
    #[error("inventory has no versions")]
    NoVersions,

    /// `contentDirectory` cannot change once manifest paths embed it.
    #[error("contentDirectory cannot be changed after the first version")]
    ContentDirectoryLocked,

    /// JSON (de)serialization failure.
    #[error("inventory JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The sidecar file content is malformed.
    #[error("malformed sidecar content: {0:?}")]
    MalformedSidecar(String),
}

/// Result alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;
