use ocfl_types::TypeError;

/// Errors from digest computation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The requested algorithm is not in the OCFL-registered set.
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] TypeError),

    /// I/O error while reading the byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;
