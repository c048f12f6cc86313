use std::collections::BTreeSet;

use serde::Serialize;

use super::GenericVersion;
use crate::error::{Error, Result};

/// Declared type of a claim. Drives coercion and the neutral default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimType {
    String,
    Bool,
    Int,
    Double,
    Version,
    Set,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "boolean",
            Self::Int => "32-bit integer",
            Self::Double => "double",
            Self::Version => "version",
            Self::Set => "set of strings",
        }
    }

    /// The value a claim takes when its accessor yields nothing usable.
    pub fn default_value(&self) -> ClaimValue {
        match self {
            Self::String => ClaimValue::String(String::new()),
            Self::Bool => ClaimValue::Bool(false),
            Self::Int => ClaimValue::Int(0),
            Self::Double => ClaimValue::Double(0.0),
            Self::Version => ClaimValue::Version(GenericVersion::ZERO),
            Self::Set => ClaimValue::Set(BTreeSet::new()),
        }
    }

    /// Convert a textual value using culture-invariant rules: `.` as the
    /// decimal separator, `true`/`false` for booleans, surrounding whitespace
    /// ignored for everything but strings.
    pub fn parse_invariant(&self, raw: &str) -> Result<ClaimValue> {
        let fail = || Error::Coercion {
            value: raw.to_string(),
            target: self.as_str(),
        };
        let trimmed = raw.trim();

        Ok(match self {
            Self::String => ClaimValue::String(raw.to_string()),
            Self::Bool => ClaimValue::Bool(parse_bool(trimmed).ok_or_else(fail)?),
            Self::Int => ClaimValue::Int(trimmed.parse().map_err(|_| fail())?),
            Self::Double => {
                let v: f64 = trimmed.parse().map_err(|_| fail())?;
                if !v.is_finite() {
                    return Err(fail());
                }
                ClaimValue::Double(v)
            }
            Self::Version => ClaimValue::Version(GenericVersion::parse(trimmed).ok_or_else(fail)?),
            Self::Set => ClaimValue::Set(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        })
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") || s == "1" {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") || s == "0" {
        Some(false)
    } else {
        None
    }
}

/// A resolved claim value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClaimValue {
    String(String),
    Bool(bool),
    Int(i32),
    Double(f64),
    Version(GenericVersion),
    Set(BTreeSet<String>),
}

impl ClaimValue {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            Self::String(_) => ClaimType::String,
            Self::Bool(_) => ClaimType::Bool,
            Self::Int(_) => ClaimType::Int,
            Self::Double(_) => ClaimType::Double,
            Self::Version(_) => ClaimType::Version,
            Self::Set(_) => ClaimType::Set,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_version(&self) -> Option<GenericVersion> {
        match self {
            Self::Version(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Bring the value to `target`, or `None` when that would lose
    /// information. Strings go through [`ClaimType::parse_invariant`].
    pub(crate) fn convert_to(self, target: ClaimType) -> Option<ClaimValue> {
        if self.claim_type() == target {
            return Some(self);
        }
        match (self, target) {
            (Self::String(s), t) => t.parse_invariant(&s).ok(),
            (Self::Int(i), ClaimType::Double) => Some(Self::Double(f64::from(i))),
            (Self::Int(i), ClaimType::Version) => Some(Self::Version(GenericVersion::from(i))),
            (Self::Double(d), ClaimType::Int)
                if d.fract() == 0.0 && d >= f64::from(i32::MIN) && d <= f64::from(i32::MAX) =>
            {
                Some(Self::Int(d as i32))
            }
            (v, ClaimType::String) => Some(Self::String(v.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{}", d),
            Self::Version(v) => write!(f, "{}", v),
            Self::Set(s) => {
                let joined: Vec<&str> = s.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ClaimValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for ClaimValue {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for ClaimValue {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<GenericVersion> for ClaimValue {
    fn from(v: GenericVersion) -> Self {
        Self::Version(v)
    }
}

impl<const N: usize> From<[&str; N]> for ClaimValue {
    fn from(items: [&str; N]) -> Self {
        Self::Set(items.iter().map(|s| s.to_string()).collect())
    }
}
