use indexmap::IndexMap;

use super::claim_value::parse_bool;
use crate::error::{Error, Result};

/// Raw property value as reported by a detection engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue(String);

impl PropertyValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_bool(&self) -> Result<bool> {
        parse_bool(self.0.trim()).ok_or_else(|| self.coercion("boolean"))
    }

    pub fn to_int(&self) -> Result<i32> {
        self.0.trim().parse().map_err(|_| self.coercion("32-bit integer"))
    }

    pub fn to_double(&self) -> Result<f64> {
        self.0.trim().parse().map_err(|_| self.coercion("double"))
    }

    fn coercion(&self, target: &'static str) -> Error {
        Error::Coercion {
            value: self.0.clone(),
            target,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Properties produced by matching one user-agent.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    values: IndexMap<String, PropertyValue>,
    /// Components that contributed at least one rule match, in match order.
    pub matched_components: Vec<String>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), PropertyValue::new(v)))
                .collect(),
            matched_components: Vec::new(),
        }
    }
}
