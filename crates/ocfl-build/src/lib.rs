//! The OCFL version builder.
//!
//! [`VersionBuilder`] decides, per file, whether content must be copied into
//! the object or merely referenced, according to the `forward_delta` and
//! `dedupe` policy flags. [`ObjectBuilder`] drives it against a
//! [`ocfl_store::Storage`] tree for the three object-level operations:
//! `create` (new object, single v1), `build` (replay `v1..vN` source
//! subdirectories), and `update` (append one version, optionally migrating
//! the digest algorithm or adding fixity).
//!
//! Building is fail-fast: any violated precondition aborts before storage is
//! touched further, and no partial inventory is returned.

pub mod error;
pub mod object;
pub mod version;

pub use error::{BuildError, BuildResult};
pub use object::{ObjectBuilder, ObjectOptions, UpdateOptions, VersionMeta};
pub use version::{BuildPolicy, Staging, VersionBuilder};
