use std::cell::OnceCell;

use tracing::{debug, error};

use super::cookie::ContextCookie;
use crate::detection::DetectionEngine;
use crate::error::{Error, Result};
use crate::types::{ClaimType, ClaimValue, GenericVersion, PropertySet, PropertyValue};

/// Per-request data the accessors read from.
///
/// The user-agent is matched at most once, on first use; the context cookie
/// is parsed up front.
pub struct Sources<'a> {
    engine: &'a dyn DetectionEngine,
    user_agent: Option<&'a str>,
    cookie: Option<std::result::Result<ContextCookie, &'a str>>,
    detection: OnceCell<Option<PropertySet>>,
}

impl<'a> Sources<'a> {
    pub fn new(
        engine: &'a dyn DetectionEngine,
        user_agent: Option<&'a str>,
        context_cookie: Option<&'a str>,
    ) -> Self {
        let cookie = context_cookie.map(ContextCookie::parse_segments);
        Self {
            engine,
            user_agent,
            cookie,
            detection: OnceCell::new(),
        }
    }

    fn properties(&self) -> Option<&PropertySet> {
        self.detection
            .get_or_init(|| {
                let ua = self.user_agent?;
                match self.engine.match_user_agent(ua) {
                    Ok(props) => Some(props),
                    Err(e) => {
                        error!(user_agent = ua, error = %e, "device detection failed");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Read a detection property as `ty`. An empty name, a failed match or
    /// an absent property all give the type's zero value.
    pub fn property(&self, name: &str, ty: ClaimType) -> ClaimValue {
        if name.is_empty() {
            return ty.default_value();
        }
        let Some(value) = self.properties().and_then(|p| p.get(name)) else {
            return ty.default_value();
        };
        match coerce_property(value, ty) {
            Ok(v) => v,
            Err(e) => {
                error!(property = name, error = %e, "failed to read detection property");
                ty.default_value()
            }
        }
    }

    pub fn property_str(&self, name: &str) -> String {
        match self.property(name, ClaimType::String) {
            ClaimValue::String(s) => s,
            _ => String::new(),
        }
    }

    pub fn property_bool(&self, name: &str) -> bool {
        self.property(name, ClaimType::Bool).as_bool().unwrap_or(false)
    }

    /// Read a context-cookie value as `ty`. Unlike detection properties, a
    /// missing cookie or key is an error.
    pub fn context(&self, key: &str, ty: ClaimType) -> Result<ClaimValue> {
        match &self.cookie {
            None => Err(Error::MissingContextKey(key.to_string())),
            Some(Err(segment)) => Err(Error::MalformedContextCookie(segment.to_string())),
            Some(Ok(cookie)) => cookie.value(key, ty),
        }
    }
}

fn coerce_property(value: &PropertyValue, ty: ClaimType) -> Result<ClaimValue> {
    Ok(match ty {
        ClaimType::String => ClaimValue::String(value.as_str().to_string()),
        ClaimType::Bool => ClaimValue::Bool(value.to_bool()?),
        ClaimType::Int => ClaimValue::Int(value.to_int()?),
        ClaimType::Double => ClaimValue::Double(value.to_double()?),
        ClaimType::Version => ClaimValue::Version(GenericVersion::parse(value.as_str()).ok_or_else(
            || Error::Coercion {
                value: value.to_string(),
                target: ty.as_str(),
            },
        )?),
        ClaimType::Set => ty.parse_invariant(value.as_str())?,
    })
}

/// How a claim's value is computed.
#[derive(Clone, Copy)]
pub enum Accessor {
    /// A detection property, coerced to the declared type.
    Property(&'static str),
    /// A context-cookie key, converted with invariant rules.
    Context(&'static str),
    Constant(fn() -> ClaimValue),
    /// Any computation over the request sources.
    Derived(fn(&Sources<'_>) -> Result<ClaimValue>),
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property(name) => f.debug_tuple("Property").field(name).finish(),
            Self::Context(key) => f.debug_tuple("Context").field(key).finish(),
            Self::Constant(_) => f.write_str("Constant"),
            Self::Derived(_) => f.write_str("Derived"),
        }
    }
}

/// One rule of the claims table.
#[derive(Debug, Clone, Copy)]
pub struct AspectEntry {
    pub namespace: &'static str,
    pub property: &'static str,
    pub declared: ClaimType,
    pub accessor: Accessor,
}

impl AspectEntry {
    pub const fn new(
        namespace: &'static str,
        property: &'static str,
        declared: ClaimType,
        accessor: Accessor,
    ) -> Self {
        Self {
            namespace,
            property,
            declared,
            accessor,
        }
    }

    pub fn key(&self) -> String {
        format!("{}.{}", self.namespace, self.property)
    }

    /// Compute the claim. Never fails: anything unusable becomes the
    /// declared type's default.
    pub fn evaluate(&self, sources: &Sources<'_>) -> ClaimValue {
        let raw = match self.accessor {
            Accessor::Property(name) => Ok(sources.property(name, self.declared)),
            Accessor::Context(key) => sources.context(key, self.declared),
            Accessor::Constant(f) => Ok(f()),
            Accessor::Derived(f) => f(sources),
        };
        if let Err(e) = &raw {
            debug!(claim = %self.key(), error = %e, "claim resolved to default");
        }
        or_default(self.declared, raw)
    }
}

/// Turn an accessor result into a value of the declared type.
///
/// Errors and blank text become the type's neutral default; text is parsed
/// with invariant rules; other variants are converted when lossless.
pub fn or_default(declared: ClaimType, result: Result<ClaimValue>) -> ClaimValue {
    match result {
        Ok(ClaimValue::String(s)) if declared != ClaimType::String && s.trim().is_empty() => {
            declared.default_value()
        }
        Ok(value) => value
            .convert_to(declared)
            .unwrap_or_else(|| declared.default_value()),
        Err(_) => declared.default_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine(PropertySet);

    impl DetectionEngine for FixedEngine {
        fn match_user_agent(&self, _: &str) -> Result<PropertySet> {
            Ok(self.0.clone())
        }
        fn refresh(&self) -> Result<bool> {
            Ok(false)
        }
        fn add_license_key(&self, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn engine() -> FixedEngine {
        FixedEngine(PropertySet::from_iter([
            ("PlatformVendor", "Google"),
            ("PlatformVersion", "14.0"),
            ("IsMobile", "True"),
            ("ScreenWidth", "Unknown"),
        ]))
    }

    #[test]
    fn property_zero_values() {
        let e = engine();
        let s = Sources::new(&e, Some("ua"), None);
        assert_eq!(s.property("", ClaimType::String), ClaimValue::from(""));
        assert_eq!(s.property("Missing", ClaimType::Bool), ClaimValue::Bool(false));
        assert_eq!(s.property("ScreenWidth", ClaimType::Int), ClaimValue::Int(0));
        assert_eq!(
            s.property("PlatformVersion", ClaimType::Version),
            ClaimValue::Version(GenericVersion::new(14, 0, 0))
        );
        assert!(s.property_bool("IsMobile"));
    }

    #[test]
    fn no_user_agent_means_no_properties() {
        let e = engine();
        let s = Sources::new(&e, None, None);
        assert_eq!(s.property_str("PlatformVendor"), "");
    }

    #[test]
    fn context_errors() {
        let e = engine();
        let none = Sources::new(&e, None, None);
        assert!(matches!(none.context("dw", ClaimType::Int), Err(Error::MissingContextKey(_))));

        let bad = Sources::new(&e, None, Some("dw~1|dh"));
        assert!(matches!(
            bad.context("dw", ClaimType::Int),
            Err(Error::MalformedContextCookie(segment)) if segment == "dh"
        ));

        let repeated = Sources::new(&e, None, Some("dw~1|dw~2"));
        assert!(matches!(
            repeated.context("dh", ClaimType::Int),
            Err(Error::MalformedContextCookie(segment)) if segment == "dw~2"
        ));

        let good = Sources::new(&e, None, Some("dw~1024"));
        assert_eq!(good.context("dw", ClaimType::Int).unwrap(), ClaimValue::Int(1024));
    }

    #[test]
    fn or_default_policy() {
        assert_eq!(or_default(ClaimType::Int, Err(Error::MissingContextKey("x".into()))), ClaimValue::Int(0));
        assert_eq!(or_default(ClaimType::Int, Ok(ClaimValue::from(" "))), ClaimValue::Int(0));
        assert_eq!(or_default(ClaimType::Int, Ok(ClaimValue::from("12"))), ClaimValue::Int(12));
        assert_eq!(or_default(ClaimType::String, Ok(ClaimValue::from(""))), ClaimValue::from(""));
        assert_eq!(or_default(ClaimType::Set, Ok(ClaimValue::Bool(true))), ClaimType::Set.default_value());
        assert_eq!(or_default(ClaimType::Bool, Ok(ClaimValue::Bool(true))), ClaimValue::Bool(true));
    }

    #[test]
    fn evaluate_uses_the_accessor_value() {
        let e = engine();
        let s = Sources::new(&e, Some("ua"), None);
        let entry = AspectEntry::new("device", "mobile", ClaimType::Bool, Accessor::Property("IsMobile"));
        assert_eq!(entry.key(), "device.mobile");
        assert_eq!(entry.evaluate(&s), ClaimValue::Bool(true));

        let derived = AspectEntry::new(
            "device",
            "pixelDensity",
            ClaimType::Int,
            Accessor::Derived(|_| Ok(ClaimValue::Int(1))),
        );
        assert_eq!(derived.evaluate(&s), ClaimValue::Int(1));
    }
}
