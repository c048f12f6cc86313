//! Configuration for the claims provider.
//!
//! Values come from a YAML file, optionally overlaid with environment
//! variables:
//!
//! ```yaml
//! detection:
//!   database_path: ~/App_Data/properties.yml
//!   app_root: /srv/site
//!   dataset_url: https://example.org/properties.yml
//! site:
//!   deviceDetection.licenseKey: ABCDEF123456
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Site setting holding the detection license key.
pub const LICENSE_KEY_SETTING: &str = "deviceDetection.licenseKey";

const ENV_DATABASE_PATH: &str = "CONTEXT_CLAIMS_DATABASE_PATH";
const ENV_DATASET_URL: &str = "CONTEXT_CLAIMS_DATASET_URL";
const ENV_LICENSE_KEY: &str = "CONTEXT_CLAIMS_LICENSE_KEY";

/// Per-site settings lookup. A lookup may fail (the backing store is
/// unavailable); a missing key is `Ok(None)`.
pub trait SiteSettings {
    fn setting(&self, key: &str) -> Result<Option<String>>;
}

impl SiteSettings for IndexMap<String, String> {
    fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).cloned())
    }
}

impl SiteSettings for HashMap<String, String> {
    fn setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).cloned())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    pub detection: DetectionConfig,
    pub site: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Where the detection engine expects its database. `~/` is relative to
    /// `app_root`.
    pub database_path: Option<PathBuf>,
    /// Application root used to resolve `~/` paths.
    pub app_root: Option<PathBuf>,
    /// Download location used when the database file is missing. Without
    /// one, a missing database is not fetched.
    pub dataset_url: Option<String>,
}

impl DetectionConfig {
    pub fn dataset_url(&self) -> Option<&str> {
        self.dataset_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// The on-disk database path with any `~/` prefix mapped onto
    /// `app_root`. `Ok(None)` when no path is configured.
    pub fn effective_database_path(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.database_path else {
            return Ok(None);
        };
        let Ok(relative) = path.strip_prefix("~") else {
            return Ok(Some(path.clone()));
        };
        match &self.app_root {
            Some(root) => Ok(Some(root.join(relative))),
            None => Err(Error::Config(format!(
                "database path {} is app-relative but no app_root is configured",
                path.display()
            ))),
        }
    }
}

impl ClaimsConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Overlay `CONTEXT_CLAIMS_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::vars())
    }

    pub(crate) fn with_overrides(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in vars {
            match key.as_str() {
                ENV_DATABASE_PATH => self.detection.database_path = Some(PathBuf::from(value)),
                ENV_DATASET_URL => self.detection.dataset_url = Some(value),
                ENV_LICENSE_KEY => {
                    self.site.insert(LICENSE_KEY_SETTING.to_string(), value);
                }
                _ => {}
            }
        }
        self
    }
}

impl SiteSettings for ClaimsConfig {
    fn setting(&self, key: &str) -> Result<Option<String>> {
        self.site.setting(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml() {
        let cfg = ClaimsConfig::from_yaml_str(
            r#"
detection:
  database_path: ~/App_Data/properties.yml
  app_root: /srv/site
site:
  deviceDetection.licenseKey: ABCDEF123456
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.detection.effective_database_path().unwrap(),
            Some(PathBuf::from("/srv/site/App_Data/properties.yml"))
        );
        assert_eq!(cfg.detection.dataset_url(), None);
        assert_eq!(
            cfg.setting(LICENSE_KEY_SETTING).unwrap().as_deref(),
            Some("ABCDEF123456")
        );
    }

    #[test]
    fn app_relative_path_needs_root() {
        let cfg = ClaimsConfig::from_yaml_str("detection: { database_path: ~/data.yml }").unwrap();
        assert!(matches!(
            cfg.detection.effective_database_path(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn empty_document_is_default() {
        let cfg = ClaimsConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg.detection.effective_database_path().unwrap(), None);
        assert_eq!(cfg.setting(LICENSE_KEY_SETTING).unwrap(), None);
    }

    #[test]
    fn overrides_replace_file_values() {
        let cfg = ClaimsConfig::default().with_overrides([
            (ENV_DATASET_URL.to_string(), "http://mirror/db.yml".to_string()),
            (ENV_LICENSE_KEY.to_string(), "KEY12345".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ]);
        assert_eq!(cfg.detection.dataset_url(), Some("http://mirror/db.yml"));
        assert_eq!(cfg.site[LICENSE_KEY_SETTING], "KEY12345");
    }
}
