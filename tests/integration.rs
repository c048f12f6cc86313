use context_claims::{
    ClaimValue, ClaimsConfig, ContextClaimsProvider, DetectionEngine, FileDetectionEngine,
    PropertySet, RequestContext, Result,
};
use fixtures::fixtures;
use indexmap::IndexMap;
use serde::Deserialize;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, OnceLock};

const DATABASE: &str = "tests/data/properties.yml";

// Global engine instance that is loaded once
static ENGINE: OnceLock<Arc<FileDetectionEngine>> = OnceLock::new();

fn shared_engine() -> Arc<FileDetectionEngine> {
    ENGINE
        .get_or_init(|| {
            let engine = FileDetectionEngine::open(DATABASE).expect("failed to load property database");
            Arc::new(engine)
        })
        .clone()
}

fn no_settings() -> IndexMap<String, String> {
    IndexMap::new()
}

/// Versions compare by their dotted form; everything else by its plain YAML
/// shape (sets are sorted sequences).
fn as_yaml(value: &ClaimValue) -> serde_yaml::Value {
    match value {
        ClaimValue::Version(v) => serde_yaml::Value::String(v.to_string()),
        other => serde_yaml::to_value(other).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// User-agent fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ClaimsFixture {
    user_agent: String,
    #[serde(default)]
    cookie: Option<String>,
    expected: IndexMap<String, serde_yaml::Value>,
}

#[fixtures(["tests/fixtures/*.yml"])]
#[test]
fn test_claims_fixtures(path: &Path) {
    let content = std::fs::read_to_string(path).unwrap();
    let fixture: ClaimsFixture = serde_yaml::from_str(&content).unwrap();

    let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), shared_engine());
    let site = no_settings();
    let mut request = RequestContext::new(&site).with_user_agent(&fixture.user_agent);
    if let Some(cookie) = &fixture.cookie {
        request = request.with_context_cookie(cookie);
    }

    let claims = provider.resolve("device", &request).unwrap();
    assert_eq!(claims.len(), 40, "claim count for UA: {}", fixture.user_agent);

    for (key, expected) in &fixture.expected {
        let actual = claims
            .get(key)
            .unwrap_or_else(|| panic!("missing claim {} for UA: {}", key, fixture.user_agent));
        assert_eq!(
            &as_yaml(actual),
            expected,
            "claim {} mismatch for UA: {}",
            key,
            fixture.user_agent
        );
    }
}

// ---------------------------------------------------------------------------
// Vendor comparison ignores case
// ---------------------------------------------------------------------------

struct VendorEngine(&'static str);

impl DetectionEngine for VendorEngine {
    fn match_user_agent(&self, _: &str) -> Result<PropertySet> {
        Ok(PropertySet::from_iter([("PlatformVendor", self.0)]))
    }
    fn refresh(&self) -> Result<bool> {
        Ok(false)
    }
    fn add_license_key(&self, _: &str) -> Result<()> {
        Ok(())
    }
}

#[test]
fn android_vendor_is_case_insensitive() {
    let site = no_settings();
    for vendor in ["ANDROID", "android", "Android"] {
        let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), VendorEngine(vendor));
        let claims = provider
            .resolve("ui", &RequestContext::new(&site).with_user_agent("any"))
            .unwrap();
        assert_eq!(claims.get("ui.android"), Some(&ClaimValue::Bool(true)), "{}", vendor);
        assert_eq!(claims.get("os.vendor"), Some(&ClaimValue::from(vendor)));
    }

    let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), VendorEngine("Androidish"));
    let claims = provider
        .resolve("ui", &RequestContext::new(&site).with_user_agent("any"))
        .unwrap();
    assert_eq!(claims.get("ui.android"), Some(&ClaimValue::Bool(false)));
}

// ---------------------------------------------------------------------------
// Engine lifecycle through the provider
// ---------------------------------------------------------------------------

#[test]
fn missing_database_still_resolves_every_claim() {
    let dir = tempfile::tempdir().unwrap();
    let engine = FileDetectionEngine::new(dir.path().join("absent.yml"));
    let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), engine);
    let site = no_settings();

    let claims = provider
        .resolve("", &RequestContext::new(&site).with_user_agent("Mozilla/5.0 (Linux; Android 14)"))
        .unwrap();
    assert_eq!(claims.len(), provider.aspects().len());
    assert_eq!(claims.get("os.vendor"), Some(&ClaimValue::from("")));
    assert_eq!(claims.get("device.mobile"), Some(&ClaimValue::Bool(false)));
}

#[test]
fn corrupt_database_fails_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("properties.yml");
    std::fs::write(&path, "components: [ { name: broken, rules: [ { regex: '(' } ] } ]").unwrap();

    let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), FileDetectionEngine::new(&path));
    let site = no_settings();
    assert!(provider.resolve("", &RequestContext::new(&site)).is_err());
}

#[test]
fn present_database_is_not_downloaded_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("App_Data/properties.yml");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::copy(DATABASE, &path).unwrap();

    let config = ClaimsConfig::from_yaml_str(&format!(
        "detection:\n  database_path: ~/App_Data/properties.yml\n  app_root: {}\n  dataset_url: http://127.0.0.1:9/unused\n",
        dir.path().display()
    ))
    .unwrap();
    let engine = FileDetectionEngine::from_config(&config.detection).unwrap();
    let provider = ContextClaimsProvider::new(&config, engine);
    assert_eq!(provider.bootstrap_outcome(), context_claims::BootstrapOutcome::Present);

    let site = no_settings();
    let claims = provider
        .resolve("", &RequestContext::new(&site).with_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"))
        .unwrap();
    assert_eq!(claims.get("os.model"), Some(&ClaimValue::from("Windows")));
}

#[test]
fn unreachable_dataset_url_does_not_prevent_construction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/properties.yml");
    let config = ClaimsConfig::from_yaml_str(&format!(
        "detection:\n  database_path: {}\n  dataset_url: http://127.0.0.1:9/properties.yml\n",
        path.display()
    ))
    .unwrap();

    let provider = ContextClaimsProvider::new(&config, FileDetectionEngine::new(&path));
    assert_eq!(provider.bootstrap_outcome(), context_claims::BootstrapOutcome::Failed);
    assert!(!path.exists());

    let site = no_settings();
    let claims = provider.resolve("", &RequestContext::new(&site)).unwrap();
    assert_eq!(claims.len(), 40);
}

/// Serve one `200 OK` response with a binary body on a local port.
fn serve_binary_once(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    });
    format!("http://{}/51Degrees-Lite.dat", addr)
}

#[test]
fn unreadable_download_leaves_provider_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("properties.yml");
    let url = serve_binary_once(&[0x35, 0x31, 0xff, 0xfe, 0x00, 0x01, 0x80, 0x81, 0xc0, 0x00, 0x03, 0x02, 0xfd, 0xee]);
    let config = ClaimsConfig::from_yaml_str(&format!(
        "detection:\n  database_path: {}\n  dataset_url: {}\n",
        path.display(),
        url
    ))
    .unwrap();

    let provider = ContextClaimsProvider::new(&config, FileDetectionEngine::from_config(&config.detection).unwrap());
    assert_eq!(provider.bootstrap_outcome(), context_claims::BootstrapOutcome::Failed);
    assert!(!path.exists());

    let site = no_settings();
    for _ in 0..3 {
        let claims = provider
            .resolve("", &RequestContext::new(&site).with_user_agent("Mozilla/5.0 (Linux; Android 14)"))
            .unwrap();
        assert_eq!(claims.len(), 40);
        assert_eq!(claims.get("device.mobile"), Some(&ClaimValue::Bool(false)));
    }
}

#[test]
fn claims_serialize_as_flat_map() {
    let provider = ContextClaimsProvider::new(&ClaimsConfig::default(), shared_engine());
    let site = no_settings();
    let claims = provider
        .resolve("", &RequestContext::new(&site).with_context_cookie("dw~800"))
        .unwrap();
    let yaml = serde_yaml::to_value(&claims).unwrap();
    assert_eq!(yaml["browser.displayWidth"], serde_yaml::to_value(800).unwrap());
    assert_eq!(yaml["device.4g"], serde_yaml::Value::Bool(false));
}
