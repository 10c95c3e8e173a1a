use ocfl_digest::DigestError;
use ocfl_inventory::InventoryError;
use ocfl_store::StoreError;
use ocfl_types::TypeError;

/// Errors from object building.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// The target path already holds something.
    #[error("cannot create object: {root:?} is not empty")]
    ObjectExists { root: String },

    /// The target path does not hold a readable OCFL object.
    #[error("no OCFL object at {root:?}: {reason}")]
    NotAnObject { root: String, reason: String },

    /// `build` was given a source tree without version subdirectories.
    #[error("source tree has no v1..vN version directories")]
    NoSourceVersions,

    /// `build` source version directories are not a contiguous v1..vN run.
    #[error("source version directories are not contiguous: expected {expected}, found {found}")]
    NonContiguousSource { expected: String, found: String },

    /// Files sharing a digest under the old algorithm disagree under the new
    /// one; the object is corrupt and migration aborts.
    #[error(
        "digest-algorithm migration inconsistency for {digest}: \
         {path:?} computed {computed}, expected {expected}"
    )]
    AlgorithmMigrationInconsistency {
        digest: String,
        path: String,
        expected: String,
        computed: String,
    },
}

/// Result alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;
