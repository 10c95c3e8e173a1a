use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Supported OCFL specification versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecVersion {
    V1_0,
    V1_1,
}

impl SpecVersion {
    pub const ALL: [Self; 2] = [Self::V1_0, Self::V1_1];

    /// Dotted version number, e.g. `1.1`.
    pub fn number(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
        }
    }

    /// The inventory `type` URI for this spec version.
    pub fn inventory_type(&self) -> String {
        format!("https://ocfl.io/{}/spec/#inventory", self.number())
    }

    /// The NAMASTE tag for an object conforming to this spec version,
    /// without the leading `0=`.
    pub fn object_tag(&self) -> String {
        format!("ocfl_object_{}", self.number())
    }

    /// Parse from an inventory `type` URI.
    pub fn from_inventory_type(uri: &str) -> Result<Self, TypeError> {
        Self::ALL
            .iter()
            .find(|v| v.inventory_type() == uri)
            .copied()
            .ok_or_else(|| TypeError::UnsupportedSpecVersion(uri.to_string()))
    }

    /// Parse from a NAMASTE object tag (`ocfl_object_1.1`).
    pub fn from_object_tag(tag: &str) -> Result<Self, TypeError> {
        Self::ALL
            .iter()
            .find(|v| v.object_tag() == tag)
            .copied()
            .ok_or_else(|| TypeError::UnsupportedSpecVersion(tag.to_string()))
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.number())
    }
}

impl FromStr for SpecVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.number() == s)
            .copied()
            .ok_or_else(|| TypeError::UnsupportedSpecVersion(s.to_string()))
    }
}

impl Serialize for SpecVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inventory_type())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        Self::from_inventory_type(&uri).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_type_uri() {
        assert_eq!(
            SpecVersion::V1_1.inventory_type(),
            "https://ocfl.io/1.1/spec/#inventory"
        );
    }

    #[test]
    fn object_tag_roundtrip() {
        for v in SpecVersion::ALL {
            assert_eq!(SpecVersion::from_object_tag(&v.object_tag()).unwrap(), v);
        }
    }

    #[test]
    fn unknown_uri_is_rejected() {
        assert!(SpecVersion::from_inventory_type("https://ocfl.io/2.0/spec/#inventory").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&SpecVersion::V1_0).unwrap();
        assert_eq!(json, "\"https://ocfl.io/1.0/spec/#inventory\"");
        let parsed: SpecVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SpecVersion::V1_0);
    }
}
