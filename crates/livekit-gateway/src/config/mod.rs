//! Configuration for the gateway
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary) and fall back to development defaults. The
//! configuration is read once at startup and never reloaded.

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, Environment, Map};
use serde::Deserialize;

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_SERVER_PORT: u16 = 6080;

/// Default control-plane endpoint
pub const DEFAULT_LIVEKIT_URL: &str = "http://localhost:7880";

/// Default API key (LiveKit dev mode)
pub const DEFAULT_API_KEY: &str = "devkey";

/// Default API secret (LiveKit dev mode)
pub const DEFAULT_API_SECRET: &str = "secret";

/// Default per-call timeout for control-plane requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default lifetime of issued join tokens (6 hours)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 6 * 60 * 60;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!(
                "Unsupported LOG_FORMAT '{}', expected 'pretty' or 'json'",
                other
            ))),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port the HTTP server listens on (all interfaces)
    pub server_port: u16,
    /// LiveKit server URL, `http(s)://` or `ws(s)://`
    pub livekit_url: String,
    pub livekit_api_key: String,
    pub livekit_api_secret: String,
    /// Per-call timeout for control-plane requests, in seconds
    pub request_timeout_secs: u64,
    /// Lifetime of issued join tokens, in seconds
    pub token_ttl_secs: u64,
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Flat view of the environment, keyed by lowercased variable name
#[derive(Debug, Deserialize)]
struct RawSettings {
    server_port: u16,
    livekit_url: String,
    livekit_api_key: Option<String>,
    // Older deployments name the key variable LIVEKIT_API
    livekit_api: Option<String>,
    livekit_api_secret: String,
    livekit_request_timeout_secs: u64,
    livekit_token_ttl_secs: u64,
    log_level: String,
    log_format: String,
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::default())
    }

    /// Load configuration from an explicit set of variables
    ///
    /// Keys use the environment names (`SERVER_PORT`, `LIVEKIT_URL`, ...).
    /// The process environment is not consulted.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(Environment::default().source(Some(source)))
    }

    fn load(environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("server_port", i64::from(DEFAULT_SERVER_PORT))?
            .set_default("livekit_url", DEFAULT_LIVEKIT_URL)?
            .set_default("livekit_api_secret", DEFAULT_API_SECRET)?
            .set_default(
                "livekit_request_timeout_secs",
                DEFAULT_REQUEST_TIMEOUT_SECS as i64,
            )?
            .set_default("livekit_token_ttl_secs", DEFAULT_TOKEN_TTL_SECS as i64)?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?
            .add_source(environment)
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;

        let config = Self {
            server_port: raw.server_port,
            livekit_url: raw.livekit_url.trim().to_string(),
            livekit_api_key: raw
                .livekit_api_key
                .or(raw.livekit_api)
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            livekit_api_secret: raw.livekit_api_secret,
            request_timeout_secs: raw.livekit_request_timeout_secs,
            token_ttl_secs: raw.livekit_token_ttl_secs,
            log_level: raw.log_level,
            log_format: LogFormat::parse(&raw.log_format)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values the gateway cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.livekit_api_key.trim().is_empty() {
            return Err(Error::config("LIVEKIT_API_KEY must not be empty"));
        }
        if self.livekit_api_secret.is_empty() {
            return Err(Error::config("LIVEKIT_API_SECRET must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config(
                "LIVEKIT_REQUEST_TIMEOUT_SECS must be greater than zero",
            ));
        }
        if self.token_ttl_secs == 0 {
            return Err(Error::config("LIVEKIT_TOKEN_TTL_SECS must be greater than zero"));
        }

        let url = self.livekit_url.to_ascii_lowercase();
        let has_scheme = ["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len());
        if !has_scheme {
            return Err(Error::config(format!(
                "LIVEKIT_URL '{}' must start with http://, https://, ws:// or wss://",
                self.livekit_url
            )));
        }

        Ok(())
    }

    /// Base URL for control-plane calls
    ///
    /// WebSocket schemes are mapped to their HTTP equivalents and any
    /// trailing slash is dropped.
    pub fn control_plane_url(&self) -> String {
        normalize_url(&self.livekit_url)
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.server_port))
    }

    /// Per-call timeout for control-plane requests
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Lifetime of issued join tokens
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            livekit_url: DEFAULT_LIVEKIT_URL.to_string(),
            livekit_api_key: DEFAULT_API_KEY.to_string(),
            livekit_api_secret: DEFAULT_API_SECRET.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("wss://") {
        format!("https://{}", &trimmed["wss://".len()..])
    } else if lower.starts_with("ws://") {
        format!("http://{}", &trimmed["ws://".len()..])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = GatewayConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.server_port, 6080);
        assert_eq!(config.livekit_url, "http://localhost:7880");
        assert_eq!(config.livekit_api_key, "devkey");
        assert_eq!(config.livekit_api_secret, "secret");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.token_ttl(), Duration::from_secs(21600));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_address().port(), 6080);
    }

    #[test]
    fn test_environment_names_override_defaults() {
        let config = GatewayConfig::from_vars([
            ("SERVER_PORT", "8080"),
            ("LIVEKIT_URL", "wss://media.example.com/"),
            ("LIVEKIT_API_KEY", "APIabc"),
            ("LIVEKIT_API_SECRET", "s3cr3t"),
            ("LIVEKIT_REQUEST_TIMEOUT_SECS", "3"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.livekit_api_key, "APIabc");
        assert_eq!(config.livekit_api_secret, "s3cr3t");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.control_plane_url(), "https://media.example.com");
    }

    #[test]
    fn test_legacy_key_variable_is_accepted() {
        let config = GatewayConfig::from_vars([("LIVEKIT_API", "legacy-key")]).unwrap();
        assert_eq!(config.livekit_api_key, "legacy-key");

        let config = GatewayConfig::from_vars([
            ("LIVEKIT_API", "legacy-key"),
            ("LIVEKIT_API_KEY", "primary-key"),
        ])
        .unwrap();
        assert_eq!(config.livekit_api_key, "primary-key");
    }

    #[test]
    fn test_credentials_are_taken_verbatim() {
        for secret in ["123456", "0123456789", "1e3", "TRUE", "12345678901234567890123"] {
            let config = GatewayConfig::from_vars([("LIVEKIT_API_SECRET", secret)]).unwrap();
            assert_eq!(config.livekit_api_secret, secret);
        }

        let config = GatewayConfig::from_vars([("LIVEKIT_API_KEY", "0123")]).unwrap();
        assert_eq!(config.livekit_api_key, "0123");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(GatewayConfig::from_vars([("LIVEKIT_URL", "localhost:7880")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_REQUEST_TIMEOUT_SECS", "0")]).is_err());
        assert!(GatewayConfig::from_vars([("SERVER_PORT", "not-a-port")]).is_err());
        assert!(GatewayConfig::from_vars([("LOG_FORMAT", "xml")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_API_KEY", "")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_API_SECRET", "")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_TOKEN_TTL_SECS", "0")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_URL", "wss://")]).is_err());
        assert!(GatewayConfig::from_vars([("LIVEKIT_URL", "")]).is_err());
    }

    #[test]
    fn test_validate_checks_each_field() {
        let valid = GatewayConfig::default();
        assert!(valid.validate().is_ok());

        let cases = [
            GatewayConfig { livekit_api_key: " ".to_string(), ..GatewayConfig::default() },
            GatewayConfig { livekit_api_secret: String::new(), ..GatewayConfig::default() },
            GatewayConfig { token_ttl_secs: 0, ..GatewayConfig::default() },
            GatewayConfig { request_timeout_secs: 0, ..GatewayConfig::default() },
            GatewayConfig { livekit_url: "http://".to_string(), ..GatewayConfig::default() },
            GatewayConfig { livekit_url: "ftp://media".to_string(), ..GatewayConfig::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn test_control_plane_url_normalization() {
        assert_eq!(normalize_url("ws://localhost:7880"), "http://localhost:7880");
        assert_eq!(normalize_url("https://lk.example.com/"), "https://lk.example.com");
        assert_eq!(normalize_url("http://127.0.0.1:7880"), "http://127.0.0.1:7880");
    }
}
