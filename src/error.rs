#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
    #[error(transparent)]
    Regex(#[from] fancy_regex::Error),
    #[error(transparent)]
    AhoCorasick(#[from] aho_corasick::BuildError),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("dataset download from {url} failed with HTTP {status}")]
    Http { url: String, status: u16 },
    #[error("operation `{operation}` is not supported by this membership provider")]
    Unsupported { operation: &'static str },
    #[error("context cookie has no value for `{0}`")]
    MissingContextKey(String),
    #[error("malformed context cookie segment `{0}`")]
    MalformedContextCookie(String),
    #[error("cannot convert `{value}` to {target}")]
    Coercion { value: String, target: &'static str },
    #[error("license key rejected: {0}")]
    InvalidLicenseKey(String),
    #[error("detection database has not been loaded from {0}")]
    DatabaseNotLoaded(String),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
