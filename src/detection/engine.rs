use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::debug;

use super::component::CompiledComponent;
use super::database::DatabaseFile;
use super::DetectionEngine;
use crate::config::DetectionConfig;
use crate::error::{Error, Result};
use crate::types::{PropertySet, PropertyValue};

/// A compiled property database.
///
/// Matching runs every component in order; each contributes the properties
/// of its first matching rule, overriding `defaults` and earlier components.
pub struct PropertyDatabase {
    version: Option<String>,
    published: Option<String>,
    defaults: Vec<(String, String)>,
    components: Vec<CompiledComponent>,
}

impl PropertyDatabase {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: DatabaseFile = serde_yaml::from_str(yaml)?;
        Self::compile(file)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    fn compile(file: DatabaseFile) -> Result<Self> {
        // Components are independent; compile them concurrently, order kept.
        let components = file
            .components
            .into_par_iter()
            .map(CompiledComponent::build)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: file.version,
            published: file.published,
            defaults: file.defaults.into_iter().collect(),
            components,
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn published(&self) -> Option<&str> {
        self.published.as_deref()
    }

    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name.as_str())
    }

    pub fn rule_count(&self) -> usize {
        self.components.iter().map(|c| c.rule_count()).sum()
    }

    pub fn lookup(&self, ua: &str) -> PropertySet {
        let mut out = PropertySet::new();
        for (name, value) in &self.defaults {
            out.insert(name.clone(), PropertyValue::new(value.clone()));
        }
        for component in &self.components {
            component.apply(ua, &mut out);
        }
        out
    }
}

struct Loaded {
    database: Arc<PropertyDatabase>,
    modified: SystemTime,
}

/// Detection engine backed by a property database file on disk.
///
/// Nothing is read at construction; the first [`DetectionEngine::refresh`]
/// loads the file, later calls reload it when its modification time moves
/// forward.
pub struct FileDetectionEngine {
    path: PathBuf,
    state: RwLock<Option<Loaded>>,
    license_keys: RwLock<Vec<String>>,
}

impl FileDetectionEngine {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(None),
            license_keys: RwLock::new(Vec::new()),
        }
    }

    /// Create the engine at the configured database path, the same path the
    /// bootstrap download writes to.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let path = config
            .effective_database_path()?
            .ok_or_else(|| Error::Config("no detection database path configured".to_string()))?;
        Ok(Self::new(path))
    }

    /// Create the engine and load the database immediately.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let engine = Self::new(path);
        if !engine.refresh()? {
            return Err(Error::DatabaseNotLoaded(engine.path.display().to_string()));
        }
        Ok(engine)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self) -> Option<Arc<PropertyDatabase>> {
        self.state.read().as_ref().map(|l| Arc::clone(&l.database))
    }

    pub fn license_keys(&self) -> Vec<String> {
        self.license_keys.read().clone()
    }
}

impl DetectionEngine for FileDetectionEngine {
    fn match_user_agent(&self, user_agent: &str) -> Result<PropertySet> {
        let database = self
            .database()
            .ok_or_else(|| Error::DatabaseNotLoaded(self.path.display().to_string()))?;
        Ok(database.lookup(user_agent))
    }

    fn refresh(&self) -> Result<bool> {
        let modified = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let current = self.state.read().as_ref().map(|l| l.modified);
        if current.is_some_and(|loaded| modified <= loaded) {
            return Ok(false);
        }

        let database = PropertyDatabase::from_path(&self.path)?;
        debug!(
            path = %self.path.display(),
            version = database.version().unwrap_or("unknown"),
            rules = database.rule_count(),
            "loaded detection database"
        );

        *self.state.write() = Some(Loaded {
            database: Arc::new(database),
            modified,
        });
        Ok(true)
    }

    fn add_license_key(&self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.len() < 8 || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidLicenseKey(
                "expected at least 8 ASCII letters or digits".to_string(),
            ));
        }
        let mut keys = self.license_keys.write();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
        Ok(())
    }
}
