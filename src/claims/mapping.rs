use std::collections::BTreeSet;

use super::aspect::{Accessor, AspectEntry, Sources};
use crate::error::Result;
use crate::types::{ClaimType, ClaimValue, GenericVersion};

use Accessor::{Constant, Context, Derived, Property};
use ClaimType::{Bool, Double, Int, Set, String as Str, Version};

const CSS3_PROPERTIES: [&str; 7] = [
    "CssBackground",
    "CssColor",
    "CssColumn",
    "CssFont",
    "CssImages",
    "CssText",
    "CssTransitions",
];

/// The reference mapping from detection properties and context-cookie values
/// to audience-targeting claims, in evaluation order.
pub fn default_aspect_map() -> Vec<AspectEntry> {
    vec![
        AspectEntry::new("os", "vendor", Str, Property("PlatformVendor")),
        AspectEntry::new("os", "model", Str, Property("PlatformName")),
        AspectEntry::new("os", "version", Version, Property("PlatformVersion")),
        AspectEntry::new("userRequest", "fullUrl", Str, Constant(empty_string)),
        AspectEntry::new("ui", "android", Bool, Derived(is_android)),
        AspectEntry::new("ui", "largeBrowser", Bool, Derived(is_desktop)),
        AspectEntry::new("browser", "displayWidth", Int, Context("dw")),
        AspectEntry::new("browser", "displayHeight", Int, Context("dh")),
        AspectEntry::new("browser", "displayColorDepth", Int, Context("bcd")),
        AspectEntry::new("browser", "cookieSupport", Bool, Property("CookiesCapable")),
        AspectEntry::new("browser", "stylesheetSupport", Set, Derived(stylesheet_support)),
        AspectEntry::new("browser", "inputModeSupport", Set, Constant(input_mode_support)),
        AspectEntry::new("browser", "jsVersion", Version, Constant(zero_version)),
        AspectEntry::new("browser", "cssVersion", Version, Constant(zero_version)),
        AspectEntry::new("browser", "version", Version, Constant(zero_version)),
        AspectEntry::new("browser", "scriptSupport", Set, Derived(script_support)),
        AspectEntry::new("browser", "inputDevices", Set, Constant(empty_set)),
        AspectEntry::new("browser", "imageFormatSupport", Set, Constant(empty_set)),
        AspectEntry::new("browser", "markupSupport", Set, Derived(markup_support)),
        AspectEntry::new("browser", "vendor", Str, Property("BrowserVendor")),
        // no detection property feeds these two yet
        AspectEntry::new("browser", "preferredHtmlContentType", Str, Property("")),
        AspectEntry::new("browser", "variant", Str, Property("")),
        AspectEntry::new("browser", "model", Str, Property("BrowserName")),
        AspectEntry::new("browser", "modelAndOS", Str, Derived(model_and_os)),
        AspectEntry::new("userHttp", "cacheControl", Str, Constant(empty_string)),
        AspectEntry::new("userServer", "remoteUser", Str, Constant(empty_string)),
        AspectEntry::new("userServer", "serverPort", Str, Constant(empty_string)),
        AspectEntry::new("device", "mobile", Bool, Property("IsMobile")),
        AspectEntry::new("device", "robot", Bool, Property("IsCrawler")),
        AspectEntry::new("device", "tablet", Bool, Property("IsTablet")),
        AspectEntry::new("device", "4g", Bool, Constant(no)),
        AspectEntry::new("device", "displayHeight", Int, Context("dh")),
        AspectEntry::new("device", "displayWidth", Int, Context("dw")),
        AspectEntry::new("device", "pixelDensity", Int, Constant(unit_density)),
        AspectEntry::new("device", "pixelRatio", Double, Context("dpr")),
        AspectEntry::new("device", "version", Version, Constant(zero_version)),
        AspectEntry::new("device", "inputDevices", Set, Derived(device_input_devices)),
        AspectEntry::new("device", "vendor", Str, Property("PlatformVendor")),
        AspectEntry::new("device", "variant", Str, Property("DeviceType")),
        AspectEntry::new("device", "model", Str, Property("BrowserName")),
    ]
}

fn empty_string() -> ClaimValue {
    ClaimValue::String(String::new())
}

fn empty_set() -> ClaimValue {
    ClaimValue::Set(BTreeSet::new())
}

fn zero_version() -> ClaimValue {
    ClaimValue::Version(GenericVersion::ZERO)
}

fn no() -> ClaimValue {
    ClaimValue::Bool(false)
}

// TODO: derive from ScreenPixelsWidth and ScreenMMWidth once the database carries both.
fn unit_density() -> ClaimValue {
    ClaimValue::Int(1)
}

fn input_mode_support() -> ClaimValue {
    ClaimValue::from(["useInputmodeAttribute"])
}

fn is_android(s: &Sources<'_>) -> Result<ClaimValue> {
    Ok(s.property_str("PlatformVendor").eq_ignore_ascii_case("android").into())
}

fn is_desktop(s: &Sources<'_>) -> Result<ClaimValue> {
    Ok(s.property_str("DeviceType").eq_ignore_ascii_case("desktop").into())
}

fn stylesheet_support(s: &Sources<'_>) -> Result<ClaimValue> {
    let mut set: BTreeSet<String> = ["css10", "css21"].map(String::from).into();
    if CSS3_PROPERTIES.iter().any(|p| s.property_bool(p)) {
        set.insert("css30".to_string());
    }
    Ok(ClaimValue::Set(set))
}

fn script_support(s: &Sources<'_>) -> Result<ClaimValue> {
    Ok(flag_set(&[(s.property_bool("Javascript"), "Javascript")]))
}

fn markup_support(s: &Sources<'_>) -> Result<ClaimValue> {
    Ok(flag_set(&[(s.property_bool("Html5"), "HTML5")]))
}

fn model_and_os(s: &Sources<'_>) -> Result<ClaimValue> {
    Ok(ClaimValue::String(format!(
        "{} {} {}",
        s.property_str("PlatformName"),
        s.property_str("PlatformVersion"),
        s.property_str("BrowserName")
    )))
}

fn device_input_devices(s: &Sources<'_>) -> Result<ClaimValue> {
    let desktop = s.property_str("DeviceType").eq_ignore_ascii_case("desktop");
    Ok(flag_set(&[
        (desktop, "keyboard"),
        (desktop, "mouse"),
        (s.property_bool("HasClickWheel"), "clickwheel"),
        (s.property_bool("HasKeypad"), "keypad"),
        (s.property_bool("HasTouchScreen"), "touchscreen"),
        (s.property_bool("HasTrackpad"), "trackpad"),
    ]))
}

fn flag_set(flags: &[(bool, &str)]) -> ClaimValue {
    ClaimValue::Set(
        flags
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| name.to_string())
            .collect(),
    )
}
