use std::fmt;

use serde::Serialize;

/// A `major.minor.patch` triple as used by version claims.
///
/// Detection databases report versions loosely (`"10_15_7"`, `"4.4"`,
/// `"17.1 beta"`), so parsing keeps up to three leading numeric parts and
/// ignores whatever follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GenericVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GenericVersion {
    pub const ZERO: GenericVersion = GenericVersion::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a loose version string. Returns `None` when the input does not
    /// start with a digit.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if !s.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let mut parts = [0u32; 3];
        for (slot, part) in parts.iter_mut().zip(s.split(['.', '_'])) {
            let digits: &str = match part.find(|c: char| !c.is_ascii_digit()) {
                Some(end) => &part[..end],
                None => part,
            };
            if digits.is_empty() {
                break;
            }
            *slot = digits.parse().ok()?;
            if digits.len() != part.len() {
                // trailing text such as "1 beta" ends the version
                break;
            }
        }

        Some(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl From<i32> for GenericVersion {
    fn from(major: i32) -> Self {
        Self::new(major.max(0) as u32, 0, 0)
    }
}

impl fmt::Display for GenericVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
