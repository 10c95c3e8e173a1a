//! Foundation types for the OCFL (Oxford Common File Layout) toolkit.
//!
//! This crate provides the small vocabulary shared by every other crate in
//! the workspace. Every other `ocfl-*` crate depends on `ocfl-types`.
//!
//! # Key Types
//!
//! - [`DigestAlgorithm`] — The closed set of digest algorithms OCFL names
//! - [`SpecVersion`] — Supported OCFL specification versions
//! - [`VersionNum`] — Parsed version directory name (`v3`, `v0003`)
//! - [`paths`] — Logical-path and content-directory syntax rules

pub mod algorithm;
pub mod error;
pub mod paths;
pub mod spec;
pub mod version;

pub use algorithm::DigestAlgorithm;
pub use error::TypeError;
pub use spec::SpecVersion;
pub use version::VersionNum;
