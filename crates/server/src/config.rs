//! Configuration loading and validation for the chat service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.
//! In particular, there is no fallback when `ENCRYPTION_KEY` is absent or malformed.

use anyhow::{Context, Result};
use axum::http::HeaderName;
use serde::Deserialize;
use zeroize::Zeroize;

use crate::crypto::SecretKey;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte process key. **Required.** Decoded into a
    /// [`SecretKey`] by [`Config::from_env`]; this copy is then zeroed. The
    /// copies held by the process environment and the `config` builder are not.
    #[serde(default)]
    encryption_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Header carrying the authenticated user id, set by the upstream auth proxy.
    #[serde(default = "default_user_header")]
    pub user_header_name: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP endpoint for span export. Empty disables export.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: String,

    /// Per-request timeout applied by the HTTP layer.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_listen_port() -> u16 {
    8080
}
fn default_user_header() -> String {
    "X-User-Id".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Returns the configuration together with the decoded process key.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed,
    /// or if `ENCRYPTION_KEY` does not decode to exactly 32 bytes.
    pub fn from_env() -> Result<(Self, SecretKey)> {
        Self::load(config::Environment::default())
    }

    fn load<S>(source: S) -> Result<(Self, SecretKey)>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = config::Config::builder()
            .add_source(source)
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        let key = SecretKey::from_hex(&c.encryption_key);
        c.encryption_key.zeroize();
        c.validate()?;
        Ok((c, key.context("invalid ENCRYPTION_KEY")?))
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.user_header_name, "USER_HEADER_NAME")?;
        HeaderName::from_bytes(self.user_header_name.as_bytes())
            .context("USER_HEADER_NAME is not a valid HTTP header name")?;

        if self.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }

    /// The OTLP endpoint, if span export is enabled.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        let endpoint = self.otel_exporter_otlp_endpoint.trim();
        (!endpoint.is_empty()).then_some(endpoint)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("encryption_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("user_header_name", &self.user_header_name)
            .field("log_level", &self.log_level)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
