use ocfl_digest::DigestError;
use ocfl_store::StoreError;

/// Hard failures during validation.
///
/// Spec violations are never errors here — they become diagnostics. Only
/// unprocessable input and real I/O failures abort a validation call.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// The inventory document is not a JSON object at all.
    #[error("inventory document is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Digest(#[from] DigestError),
}

/// Result alias for validation operations.
pub type ValidateResult<T> = Result<T, ValidateError>;
