//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `NEST_GRAPHQL_URL` - Catalog GraphQL endpoint (falls back to `API_URL`)
//! - `CLOUDINARY_CLOUD_NAME` - Media host cloud name
//! - `CLOUDINARY_API_KEY` - Media host API key
//! - `CLOUDINARY_API_SECRET` - Media host API secret (high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BASE_URL` - Public URL for the admin API (default: <http://localhost:3001>)
//! - `CLOUDINARY_UPLOAD_FOLDER` - Folder for uploaded images (default: minimoda/products)
//! - `CLOUDINARY_SIGNATURE_ALGORITHM` - `sha1` (default) or `sha256`
//! - `CLOUDINARY_API_BASE` - Media host API base (default: <https://api.cloudinary.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::media::SignatureAlgorithm;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Variables checked, in order, for the catalog endpoint.
pub const ENDPOINT_VARS: [&str; 2] = ["NEST_GRAPHQL_URL", "API_URL"];

/// Default folder for uploaded product images.
pub const DEFAULT_UPLOAD_FOLDER: &str = "minimoda/products";

/// Default media host API base.
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin API
    pub base_url: String,
    /// Catalog GraphQL endpoint
    pub api_url: Url,
    /// Media host configuration
    pub cloudinary: CloudinaryConfig,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Cloudinary configuration.
///
/// Implements `Debug` manually to redact the API secret.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    pub upload_folder: String,
    pub signature_algorithm: SignatureAlgorithm,
    pub api_base: Url,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("upload_folder", &self.upload_folder)
            .field("signature_algorithm", &self.signature_algorithm)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001");
        let api_url = resolve_endpoint(&ENDPOINT_VARS, get_optional_env)?;
        let cloudinary = CloudinaryConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            api_url,
            cloudinary,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CloudinaryConfig {
    /// Load only the media host settings (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is missing or the secret fails
    /// validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let signature_algorithm = get_optional_env("CLOUDINARY_SIGNATURE_ALGORITHM")
            .map(|value| {
                value.parse::<SignatureAlgorithm>().map_err(|e| {
                    ConfigError::InvalidEnvVar("CLOUDINARY_SIGNATURE_ALGORITHM".to_string(), e)
                })
            })
            .transpose()?
            .unwrap_or_default();
        let api_base = Url::parse(&get_env_or_default(
            "CLOUDINARY_API_BASE",
            DEFAULT_CLOUDINARY_API_BASE,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("CLOUDINARY_API_BASE".to_string(), e.to_string()))?;

        Ok(Self {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required_env("CLOUDINARY_API_KEY")?,
            api_secret: get_validated_secret("CLOUDINARY_API_SECRET")?,
            upload_folder: get_optional_env("CLOUDINARY_UPLOAD_FOLDER")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
            signature_algorithm,
            api_base,
        })
    }
}

/// Pick the first non-empty variable in `keys` and parse it as a URL.
///
/// # Errors
///
/// Returns `MissingEnvVar` if none is set, or `InvalidEnvVar` if the chosen
/// value is not a URL.
pub fn resolve_endpoint(
    keys: &[&str],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Url, ConfigError> {
    let (key, value) = keys
        .iter()
        .find_map(|key| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*key, v))
        })
        .ok_or_else(|| ConfigError::MissingEnvVar(keys.join(" or ")))?;

    Url::parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret from the Cloudinary console."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
