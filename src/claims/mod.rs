mod aspect;
mod cookie;
mod mapping;
mod provider;

pub use aspect::{or_default, Accessor, AspectEntry, Sources};
pub use cookie::{ContextCookie, CONTEXT_COOKIE_NAME};
pub use mapping::default_aspect_map;
pub use provider::{ClaimsProvider, ContextClaimsProvider, RequestContext};
