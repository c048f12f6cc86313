use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::types::{ClaimType, ClaimValue};

/// Name of the cookie carrying client-side display metrics.
pub const CONTEXT_COOKIE_NAME: &str = "context";

/// Client-measured display metrics, e.g. `dpr~1|dw~1600|dh~900|bcd~24`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextCookie {
    values: IndexMap<String, String>,
}

impl ContextCookie {
    /// Parse a cookie value. Empty segments are skipped; a segment lacking a
    /// key or a value, or a repeated key, makes the whole cookie malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_segments(raw).map_err(|segment| Error::MalformedContextCookie(segment.to_string()))
    }

    /// Parse a cookie value, returning the offending segment on failure.
    pub(crate) fn parse_segments(raw: &str) -> std::result::Result<Self, &str> {
        let mut values = IndexMap::new();
        for segment in raw.split('|').filter(|s| !s.is_empty()) {
            let mut parts = segment.split('~').filter(|p| !p.is_empty());
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                return Err(segment);
            };
            if values.insert(key.to_string(), value.to_string()).is_some() {
                return Err(segment);
            }
        }
        Ok(Self { values })
    }

    /// Find the `context` cookie in a raw `Cookie` request header and return
    /// its value.
    pub fn find_in_header(header: &str) -> Option<&str> {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == CONTEXT_COOKIE_NAME).then(|| value.trim().trim_matches('"'))
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up `key` and convert it to `ty`. A missing key is an error.
    pub fn value(&self, key: &str, ty: ClaimType) -> Result<ClaimValue> {
        let raw = self
            .get(key)
            .ok_or_else(|| Error::MissingContextKey(key.to_string()))?;
        ty.parse_invariant(raw)
    }
}
