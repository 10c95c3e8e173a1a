//! Path syntax rules for OCFL inventories.
//!
//! Logical paths (the user-facing names inside a version state):
//! - Must be non-empty
//! - Must not start or end with `/`
//! - Must not contain an empty segment (`//`)
//! - Must not contain a `.` or `..` segment
//!
//! The `contentDirectory` value:
//! - Must be non-empty
//! - Must not be `.` or `..`
//! - Must not contain `/`

use crate::error::TypeError;

/// Validate a logical path, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use ocfl_types::paths::validate_logical_path;
///
/// assert!(validate_logical_path("dir/file.txt").is_ok());
/// assert!(validate_logical_path("/file.txt").is_err());
/// assert!(validate_logical_path("dir/../file.txt").is_err());
/// ```
pub fn validate_logical_path(path: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidLogicalPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("must not start with '/'"));
    }
    if path.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    for segment in path.split('/') {
        match segment {
            "" => return Err(invalid("must not contain an empty segment")),
            "." | ".." => return Err(invalid("must not contain '.' or '..' segments")),
            _ => {}
        }
    }
    Ok(())
}

/// Validate a `contentDirectory` value, returning `Ok(())` if valid.
pub fn validate_content_directory(value: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidContentDirectory {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value == "." || value == ".." {
        return Err(invalid("must not be '.' or '..'"));
    }
    if value.contains('/') {
        return Err(invalid("must not contain '/'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normal_paths() {
        for ok in ["file.txt", "a/b/c", "deeply/nested/path/file", ".hidden", "a..b"] {
            assert!(validate_logical_path(ok).is_ok(), "{ok:?} should pass");
        }
    }

    #[test]
    fn rejects_bad_logical_paths() {
        for bad in [
            "",
            "/abs",
            "trailing/",
            "a//b",
            "./file",
            "a/./b",
            "a/../b",
            "..",
        ] {
            assert!(validate_logical_path(bad).is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn content_directory_rules() {
        assert!(validate_content_directory("content").is_ok());
        assert!(validate_content_directory("data").is_ok());
        for bad in ["", ".", "..", "a/b"] {
            assert!(validate_content_directory(bad).is_err(), "{bad:?} should fail");
        }
    }
}
