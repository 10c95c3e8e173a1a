//! Inventory digest sidecar files.
//!
//! Alongside every `inventory.json` sits `inventory.json.<algorithm>`
//! holding a single line: the hex digest of the inventory bytes, one space
//! (or more, per the fixity-file convention), and the literal file name.

use ocfl_types::DigestAlgorithm;

use crate::error::{InventoryError, InventoryResult};

/// The inventory file name.
pub const INVENTORY_FILE: &str = "inventory.json";

/// The sidecar file name for an algorithm (`inventory.json.sha512`).
pub fn sidecar_name(algorithm: DigestAlgorithm) -> String {
    format!("{INVENTORY_FILE}.{algorithm}")
}

/// Render sidecar content for an inventory digest.
pub fn format_sidecar(digest: &str) -> String {
    format!("{digest} {INVENTORY_FILE}\n")
}

/// Parse sidecar content, returning the recorded digest.
pub fn parse_sidecar(content: &str) -> InventoryResult<String> {
    let mut tokens = content.split_whitespace();
    let digest = tokens
        .next()
        .ok_or_else(|| InventoryError::MalformedSidecar(content.to_string()))?;
    match (tokens.next(), tokens.next()) {
        (Some(INVENTORY_FILE), None) => Ok(digest.to_ascii_lowercase()),
        _ => Err(InventoryError::MalformedSidecar(content.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_embeds_algorithm() {
        assert_eq!(sidecar_name(DigestAlgorithm::Sha512), "inventory.json.sha512");
        assert_eq!(
            sidecar_name(DigestAlgorithm::Blake2b512),
            "inventory.json.blake2b-512"
        );
    }

    #[test]
    fn format_parse_roundtrip() {
        let content = format_sidecar("abc123");
        assert_eq!(content, "abc123 inventory.json\n");
        assert_eq!(parse_sidecar(&content).unwrap(), "abc123");
    }

    #[test]
    fn parse_tolerates_extra_whitespace_and_case() {
        assert_eq!(parse_sidecar("ABC123   inventory.json\n").unwrap(), "abc123");
    }

    #[test]
    fn parse_rejects_wrong_filename_or_extra_tokens() {
        assert!(parse_sidecar("abc123 other.json\n").is_err());
        assert!(parse_sidecar("abc123 inventory.json extra\n").is_err());
        assert!(parse_sidecar("\n").is_err());
    }
}
