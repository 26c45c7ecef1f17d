use mft_types::{Credentials, DEFAULT_TENANT_HEADER, MftError, RequestContext};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};

/// Prefix for environment overrides; `__` separates nested keys.
pub const ENV_PREFIX: &str = "MFT_";

fn default_base_url() -> String {
    "https://api.raet.com/mft/v1.0".to_string()
}
fn default_tenant_header() -> String {
    DEFAULT_TENANT_HEADER.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// File API endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; file resources live under `{base_url}/files`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Header carrying the tenant id for multi-tenant tokens.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,
    /// Per-request timeout in seconds (defaults to 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tenant_header: default_tenant_header(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_token_endpoint() -> String {
    "https://api.raet.com/authentication/token".to_string()
}

/// Identity provider settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_endpoint: default_token_endpoint(),
            client_id: None,
            client_secret: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn default_max_attempts() -> u32 {
    1
}
fn default_initial_backoff_ms() -> u64 {
    200
}
fn default_max_backoff_ms() -> u64 {
    5_000
}

/// Retry settings applied by the caller; one attempt means no retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Tenant id, only needed for multi-tenant tokens.
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
    }

    /// Defaults, then the optional YAML file, then `MFT_*` environment
    /// variables (e.g. `MFT_AUTH__CLIENT_SECRET`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if a source cannot be parsed.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Client credentials for the token exchange.
    ///
    /// # Errors
    ///
    /// Returns [`MftError::Config`] if the client id or secret is missing.
    pub fn credentials(&self) -> Result<Credentials, MftError> {
        let client_id = self
            .auth
            .client_id
            .as_deref()
            .ok_or_else(|| MftError::Config("auth.client_id is not set".into()))?;
        let client_secret = self
            .auth
            .client_secret
            .as_deref()
            .ok_or_else(|| MftError::Config("auth.client_secret is not set".into()))?;
        Credentials::new(client_id, client_secret, self.auth.token_endpoint.as_str())
            .map_err(|e| MftError::Config(e.to_string()))
    }

    #[must_use]
    pub fn request_context(&self) -> RequestContext {
        RequestContext::from_tenant(self.tenant_id.as_deref())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
