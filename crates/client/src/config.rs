//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FORKLINE_API_URL` - REST backend base URL (default: `http://localhost:8080/api/`)
//! - `FORKLINE_SESSION_FILE` - Where the session token is persisted
//!   (default: `.forkline/session.json`)
//! - `FORKLINE_HTTP_TIMEOUT_SECS` - Request timeout; unset uses the transport default
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api/";
const DEFAULT_SESSION_FILE: &str = ".forkline/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub api_base_url: Url,
    /// Durable session store location
    pub session_file: PathBuf,
    /// Per-request timeout, `None` for the transport default
    pub http_timeout: Option<Duration>,
    /// Sentry DSN for error tracking (embeds a project key)
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("session_file", &self.session_file)
            .field("http_timeout", &self.http_timeout)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not
    /// parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_env_or_default("FORKLINE_API_URL", DEFAULT_API_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("FORKLINE_API_URL".to_string(), e))?;
        let session_file =
            PathBuf::from(get_env_or_default("FORKLINE_SESSION_FILE", DEFAULT_SESSION_FILE));
        let http_timeout = get_optional_env("FORKLINE_HTTP_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("FORKLINE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            api_base_url,
            session_file,
            http_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `base_url` with every other setting at its
    /// default. Used by tests and embedders that do not read the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)
                .map_err(|e| ConfigError::InvalidEnvVar("FORKLINE_API_URL".to_string(), e))?,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            http_timeout: None,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

/// Parse a base URL, forcing a trailing slash so that relative joins keep the
/// full path (`/api/` + `foods` rather than `/` + `foods`).
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err(format!("{raw} cannot be used as a base URL"));
    }
    Ok(url)
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
