use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A parsed OCFL version directory name.
///
/// Version directories are named `v<N>` with N >= 1, either unpadded (`v1`,
/// `v2`, ... `v10`) or zero-padded to a single fixed width per object
/// (`v0001`, `v0002`). A padded sequence cannot grow past its width: `v99`
/// at width 2 has no successor.
///
/// Ordering is numeric; padding width only breaks ties so that ordering is
/// consistent with equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VersionNum {
    num: u64,
    /// Total digit width when zero-padded; 0 for unpadded names.
    width: usize,
}

impl VersionNum {
    /// Unpadded version 1.
    pub const V1: Self = Self { num: 1, width: 0 };

    /// Create an unpadded version number. Returns an error for 0.
    pub fn new(num: u64) -> Result<Self, TypeError> {
        Self::with_width(num, 0)
    }

    /// Create a version number with an explicit padding width (0 = unpadded).
    pub fn with_width(num: u64, width: usize) -> Result<Self, TypeError> {
        if num == 0 {
            return Err(TypeError::InvalidVersionNum {
                name: format!("v{num:0width$}"),
                reason: "version numbers start at 1".into(),
            });
        }
        if width > 0 && digits(num) > width {
            return Err(TypeError::InvalidVersionNum {
                name: format!("v{num}"),
                reason: format!("{num} does not fit in padding width {width}"),
            });
        }
        Ok(Self { num, width })
    }

    /// The numeric version.
    pub fn number(&self) -> u64 {
        self.num
    }

    /// The zero-padding width (0 when unpadded).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether this name uses zero-padding.
    pub fn is_padded(&self) -> bool {
        self.width > 0
    }

    /// The next version in sequence, keeping the padding width.
    ///
    /// Fails with [`TypeError::VersionOverflow`] when the incremented number
    /// no longer fits the fixed width.
    pub fn next(&self) -> Result<Self, TypeError> {
        let num = self.num + 1;
        if self.width > 0 && digits(num) > self.width {
            return Err(TypeError::VersionOverflow(self.to_string()));
        }
        Ok(Self {
            num,
            width: self.width,
        })
    }

    /// The previous version, or `None` for version 1.
    pub fn previous(&self) -> Option<Self> {
        (self.num > 1).then(|| Self {
            num: self.num - 1,
            width: self.width,
        })
    }
}

fn digits(mut n: u64) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

impl fmt::Display for VersionNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width > 0 {
            write!(f, "v{:0width$}", self.num, width = self.width)
        } else {
            write!(f, "v{}", self.num)
        }
    }
}

impl FromStr for VersionNum {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidVersionNum {
            name: s.to_string(),
            reason: reason.to_string(),
        };
        let digits_part = s.strip_prefix('v').ok_or_else(|| invalid("missing 'v' prefix"))?;
        if digits_part.is_empty() {
            return Err(invalid("no digits after 'v'"));
        }
        if !digits_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("non-digit characters"));
        }
        let num: u64 = digits_part
            .parse()
            .map_err(|_| invalid("number out of range"))?;
        if num == 0 {
            return Err(invalid("version numbers start at 1"));
        }
        let width = if digits_part.starts_with('0') {
            digits_part.len()
        } else {
            0
        };
        Ok(Self { num, width })
    }
}

impl PartialOrd for VersionNum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNum {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.num
            .cmp(&other.num)
            .then(self.width.cmp(&other.width))
    }
}

impl Serialize for VersionNum {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNum {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_unpadded() {
        let v: VersionNum = "v3".parse().unwrap();
        assert_eq!(v.number(), 3);
        assert!(!v.is_padded());
        assert_eq!(v.to_string(), "v3");
    }

    #[test]
    fn parse_padded() {
        let v: VersionNum = "v0042".parse().unwrap();
        assert_eq!(v.number(), 42);
        assert_eq!(v.width(), 4);
        assert_eq!(v.to_string(), "v0042");
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["v0", "v", "3", "v-1", "v1.0", "version1", "v 1", ""] {
            assert!(bad.parse::<VersionNum>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn next_keeps_width() {
        let v: VersionNum = "v0009".parse().unwrap();
        assert_eq!(v.next().unwrap().to_string(), "v0010");
        let v: VersionNum = "v9".parse().unwrap();
        assert_eq!(v.next().unwrap().to_string(), "v10");
    }

    #[test]
    fn padded_overflow_has_no_successor() {
        let v: VersionNum = "v99".parse().unwrap();
        assert_eq!(v.next().unwrap().to_string(), "v100");
        let v: VersionNum = "v09".parse().unwrap();
        assert_eq!(v.next().unwrap_err(), TypeError::VersionOverflow("v09".into()));
    }

    #[test]
    fn previous_stops_at_one() {
        let v = VersionNum::V1;
        assert!(v.previous().is_none());
        let v: VersionNum = "v0002".parse().unwrap();
        assert_eq!(v.previous().unwrap().to_string(), "v0001");
    }

    #[test]
    fn ordering_is_numeric() {
        let v2: VersionNum = "v2".parse().unwrap();
        let v10: VersionNum = "v10".parse().unwrap();
        assert!(v2 < v10);
    }

    #[test]
    fn serde_is_directory_name() {
        let v: VersionNum = "v0003".parse().unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"v0003\"");
        let back: VersionNum = serde_json::from_str("\"v0003\"").unwrap();
        assert_eq!(back, v);
    }

    proptest! {
        #[test]
        fn display_parse_roundtrip(num in 1u64..1_000_000, pad in 0usize..9) {
            let width = if pad == 0 { 0 } else { pad.max(digits(num)) };
            let v = VersionNum::with_width(num, width).unwrap();
            let parsed: VersionNum = v.to_string().parse().unwrap();
            // An exact-width padded name has no leading zero, so it parses
            // back as unpadded; numbers always survive.
            prop_assert_eq!(parsed.number(), v.number());
            prop_assert_eq!(parsed.to_string(), v.to_string());
        }
    }
}
