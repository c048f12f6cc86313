use std::collections::HashSet;

use tracing::{debug, error, warn};

use super::aspect::{AspectEntry, Sources};
use super::cookie::ContextCookie;
use super::mapping::default_aspect_map;
use crate::bootstrap::{ensure_database, BootstrapOutcome};
use crate::config::{ClaimsConfig, SiteSettings, LICENSE_KEY_SETTING};
use crate::detection::DetectionEngine;
use crate::error::{Error, Result};
use crate::types::Claims;

/// What a claims provider sees of the incoming request.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    pub user_agent: Option<&'a str>,
    /// Value of the `context` cookie, if the client sent one.
    pub context_cookie: Option<&'a str>,
    /// Settings of the site serving the request.
    pub site: &'a dyn SiteSettings,
}

impl<'a> RequestContext<'a> {
    pub fn new(site: &'a dyn SiteSettings) -> Self {
        Self {
            user_agent: None,
            context_cookie: None,
            site,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn with_context_cookie(mut self, cookie: &'a str) -> Self {
        self.context_cookie = Some(cookie);
        self
    }

    /// Take the context cookie from a raw `Cookie` request header.
    pub fn with_cookie_header(mut self, header: &'a str) -> Self {
        self.context_cookie = ContextCookie::find_in_header(header);
        self
    }
}

/// A source of context claims in the audience-targeting pipeline.
pub trait ClaimsProvider {
    fn context_claims(&self, aspect_name: &str, request: &RequestContext<'_>) -> Result<Claims>;

    /// Device family classification, if the provider offers one.
    fn device_family(&self) -> Option<String>;
}

fn unique_keys(aspects: &[AspectEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(aspects.len());
    match aspects.iter().map(AspectEntry::key).find(|k| !seen.insert(k.clone())) {
        Some(dup) => Err(Error::Config(format!("duplicate claim `{}`", dup))),
        None => Ok(()),
    }
}

/// Claims provider driven by a detection engine and the context cookie.
pub struct ContextClaimsProvider<E> {
    aspects: Vec<AspectEntry>,
    engine: E,
    bootstrap: BootstrapOutcome,
}

impl<E: DetectionEngine> ContextClaimsProvider<E> {
    /// Build the provider with the reference aspect table, downloading the
    /// detection database first if it is missing.
    ///
    /// The reference table is fixed, so a duplicate key there is a build
    /// defect; it is logged and the later entry's value wins.
    pub fn new(config: &ClaimsConfig, engine: E) -> Self {
        let aspects = default_aspect_map();
        if let Err(e) = unique_keys(&aspects) {
            error!(error = %e, "reference aspect table is inconsistent");
        }
        Self::build(config, engine, aspects)
    }

    /// Build the provider with a custom aspect table. Fails when two entries
    /// share a `namespace.property` key.
    pub fn with_aspects(config: &ClaimsConfig, engine: E, aspects: Vec<AspectEntry>) -> Result<Self> {
        unique_keys(&aspects)?;
        Ok(Self::build(config, engine, aspects))
    }

    fn build(config: &ClaimsConfig, engine: E, aspects: Vec<AspectEntry>) -> Self {
        let bootstrap = ensure_database(&config.detection);
        Self {
            aspects,
            engine,
            bootstrap,
        }
    }

    pub fn aspects(&self) -> &[AspectEntry] {
        &self.aspects
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn bootstrap_outcome(&self) -> BootstrapOutcome {
        self.bootstrap
    }

    /// Resolve every claim in the table for this request.
    ///
    /// Only a failed database refresh is an error; individual claims fall
    /// back to their defaults.
    pub fn resolve(&self, aspect_name: &str, request: &RequestContext<'_>) -> Result<Claims> {
        debug!(aspect = aspect_name, "resolving context claims");

        self.register_license(request.site);
        self.engine.refresh()?;

        let sources = Sources::new(&self.engine, request.user_agent, request.context_cookie);
        let mut claims = Claims::with_capacity(self.aspects.len());
        for entry in &self.aspects {
            claims.insert(entry.key(), entry.evaluate(&sources));
        }
        Ok(claims)
    }

    fn register_license(&self, site: &dyn SiteSettings) {
        match site.setting(LICENSE_KEY_SETTING) {
            Ok(Some(key)) if !key.trim().is_empty() => {
                if let Err(e) = self.engine.add_license_key(&key) {
                    error!(setting = LICENSE_KEY_SETTING, error = %e, "failed to register detection license key");
                }
            }
            Ok(_) => warn!(setting = LICENSE_KEY_SETTING, "detection license key has not been populated"),
            Err(e) => {
                error!(setting = LICENSE_KEY_SETTING, error = %e, "could not read detection license key setting")
            }
        }
    }
}

impl<E: DetectionEngine> ClaimsProvider for ContextClaimsProvider<E> {
    fn context_claims(&self, aspect_name: &str, request: &RequestContext<'_>) -> Result<Claims> {
        self.resolve(aspect_name, request)
    }

    fn device_family(&self) -> Option<String> {
        None
    }
}
