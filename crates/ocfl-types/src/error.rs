use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported OCFL specification version: {0}")]
    UnsupportedSpecVersion(String),

    #[error("invalid version directory name {name:?}: {reason}")]
    InvalidVersionNum { name: String, reason: String },

    #[error("version number overflow: {0} has no successor at its padding width")]
    VersionOverflow(String),

    #[error("invalid logical path {path:?}: {reason}")]
    InvalidLogicalPath { path: String, reason: String },

    #[error("invalid content directory {value:?}: {reason}")]
    InvalidContentDirectory { value: String, reason: String },
}
