use indexmap::IndexMap;
use serde::Serialize;

use super::ClaimValue;

/// Resolved claims for one request, keyed `namespace.property` in rule order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims(IndexMap<String, ClaimValue>);

impl Claims {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self(IndexMap::with_capacity(n))
    }

    pub(crate) fn insert(&mut self, key: String, value: ClaimValue) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, ClaimValue> {
        self.0
    }
}
