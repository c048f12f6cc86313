//! Device detection: the engine seam the claims mapper reads from, and a
//! file-backed engine over a YAML property database.

mod component;
mod database;
mod engine;
mod prefilter;
mod template;

use std::sync::Arc;

pub use engine::{FileDetectionEngine, PropertyDatabase};

use crate::error::Result;
use crate::types::PropertySet;

/// Matches user-agent strings to device properties.
///
/// Implementations own their database and its refresh policy; callers treat
/// every method as a plain blocking call.
pub trait DetectionEngine: Send + Sync {
    fn match_user_agent(&self, user_agent: &str) -> Result<PropertySet>;

    /// Reload the database if a newer one is available. Returns whether a
    /// reload happened. Errors mean the database is unusable.
    fn refresh(&self) -> Result<bool>;

    /// Register a license key. Licensing is advisory; callers log failures.
    fn add_license_key(&self, key: &str) -> Result<()>;
}

impl<T: DetectionEngine + ?Sized> DetectionEngine for Arc<T> {
    fn match_user_agent(&self, user_agent: &str) -> Result<PropertySet> {
        (**self).match_user_agent(user_agent)
    }

    fn refresh(&self) -> Result<bool> {
        (**self).refresh()
    }

    fn add_license_key(&self, key: &str) -> Result<()> {
        (**self).add_license_key(key)
    }
}
