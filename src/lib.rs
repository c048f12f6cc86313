mod bootstrap;
mod claims;
mod config;
mod detection;
mod error;
mod membership;
mod types;

pub use bootstrap::{ensure_database, BootstrapOutcome};
pub use claims::{
    default_aspect_map, or_default, Accessor, AspectEntry, ClaimsProvider, ContextClaimsProvider,
    ContextCookie, RequestContext, Sources, CONTEXT_COOKIE_NAME,
};
pub use config::{ClaimsConfig, DetectionConfig, SiteSettings, LICENSE_KEY_SETTING};
pub use detection::{DetectionEngine, FileDetectionEngine, PropertyDatabase};
pub use error::{Error, Result};
pub use membership::{
    CredentialValidator, MembershipProvider, MembershipUser, Page, ProfileMembership,
    ProfileStore, UserProfile,
};
pub use types::*;
