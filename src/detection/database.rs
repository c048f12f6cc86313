use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Property database file
//
// Format: optional header fields, a `defaults` property map, then an ordered
// list of components, each an ordered list of (regex, properties) rules.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct DatabaseFile {
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "scalar_map")]
    pub defaults: IndexMap<String, String>,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComponentEntry {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuleEntry {
    pub regex: String,
    #[serde(default, deserialize_with = "scalar_map")]
    pub properties: IndexMap<String, String>,
}

/// Property values are stored as text, but YAML authors write `IsMobile: true`
/// or `PlatformVersion: 10.0` without quotes. Accept any scalar and keep its
/// textual form; booleans are spelled `True`/`False`.
fn scalar_to_string<E: serde::de::Error>(key: &str, value: serde_yaml::Value) -> Result<String, E> {
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Bool(true) => Ok("True".to_string()),
        serde_yaml::Value::Bool(false) => Ok("False".to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        other => Err(E::custom(format!(
            "property `{}` must be a scalar, found {:?}",
            key, other
        ))),
    }
}

fn scalar_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let s = scalar_to_string::<D::Error>(&k, v)?;
            Ok((k, s))
        })
        .collect()
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match raw {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(v) => scalar_to_string::<D::Error>("header", v).map(Some),
    }
}
