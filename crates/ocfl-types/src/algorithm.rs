use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The closed set of digest algorithms named by the OCFL specification.
///
/// OCFL fixes this set at specification level; there is no runtime
/// registration. `sha512` and `sha256` are the algorithms permitted as an
/// inventory's primary `digestAlgorithm` (sha512 without comment, sha256
/// with a warning); the full set is usable in `fixity` blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "blake2b-160")]
    Blake2b160,
    #[serde(rename = "blake2b-256")]
    Blake2b256,
    #[serde(rename = "blake2b-384")]
    Blake2b384,
    #[serde(rename = "blake2b-512")]
    Blake2b512,
}

impl DigestAlgorithm {
    /// All algorithms OCFL registers, in a stable order.
    pub const ALL: [Self; 8] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Blake2b160,
        Self::Blake2b256,
        Self::Blake2b384,
        Self::Blake2b512,
    ];

    /// The canonical lowercase name used in inventory documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake2b160 => "blake2b-160",
            Self::Blake2b256 => "blake2b-256",
            Self::Blake2b384 => "blake2b-384",
            Self::Blake2b512 => "blake2b-512",
        }
    }

    /// Digest output length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 | Self::Blake2b160 => 20,
            Self::Sha256 | Self::Blake2b256 => 32,
            Self::Blake2b384 => 48,
            Self::Sha512 | Self::Blake2b512 => 64,
        }
    }

    /// Length of the hex encoding of a digest.
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }

    /// Whether this algorithm is permitted as an inventory's primary
    /// `digestAlgorithm` under strict validation.
    pub fn allowed_as_primary(&self) -> bool {
        matches!(self, Self::Sha512 | Self::Sha256)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| TypeError::UnsupportedAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_roundtrip() {
        for algo in DigestAlgorithm::ALL {
            let parsed: DigestAlgorithm = algo.as_str().parse().unwrap();
            assert_eq!(algo, parsed);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "sha3-512".parse::<DigestAlgorithm>().unwrap_err();
        assert_eq!(err, TypeError::UnsupportedAlgorithm("sha3-512".into()));
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&DigestAlgorithm::Blake2b512).unwrap();
        assert_eq!(json, "\"blake2b-512\"");
        let parsed: DigestAlgorithm = serde_json::from_str("\"sha512\"").unwrap();
        assert_eq!(parsed, DigestAlgorithm::Sha512);
    }

    #[test]
    fn hex_lengths() {
        assert_eq!(DigestAlgorithm::Md5.hex_len(), 32);
        assert_eq!(DigestAlgorithm::Sha1.hex_len(), 40);
        assert_eq!(DigestAlgorithm::Sha256.hex_len(), 64);
        assert_eq!(DigestAlgorithm::Sha512.hex_len(), 128);
        assert_eq!(DigestAlgorithm::Blake2b384.hex_len(), 96);
    }

    #[test]
    fn only_sha2_family_allowed_as_primary() {
        let allowed: Vec<_> = DigestAlgorithm::ALL
            .iter()
            .filter(|a| a.allowed_as_primary())
            .collect();
        assert_eq!(
            allowed,
            vec![&DigestAlgorithm::Sha256, &DigestAlgorithm::Sha512]
        );
    }
}
