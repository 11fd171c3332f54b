//! Service configuration
//!
//! Settings come from a TOML file, with a handful of environment
//! overrides so deployments can adjust the listen address and the
//! JWKS endpoint without editing the file.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// The configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("unable to read configuration file")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed
    #[error("unable to parse configuration file")]
    Parse(#[from] toml::de::Error),
    /// An environment override held an unparseable value
    #[error("invalid value in environment variable {var}")]
    InvalidEnv {
        /// The offending variable
        var: &'static str,
    },
}

/// The full service configuration
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Token verification settings
    pub auth: AuthConfig,
    /// List pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Where the service listens
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// The address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// The port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

/// How bearer tokens are verified
#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    /// The JWKS endpoint publishing the issuer's signing keys
    pub jwks_url: String,
    /// The issuer tokens must name
    pub issuer: String,
    /// The audience tokens must name
    pub audience: String,
    /// Seconds of clock skew tolerated on the expiry check
    #[serde(default)]
    pub leeway_secs: u64,
    /// Seconds between background JWKS refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

/// How list endpoints are paged
#[derive(Clone, Debug, Deserialize)]
pub struct PaginationConfig {
    /// Records per page
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

fn default_port() -> u16 {
    8080
}

fn default_refresh_interval() -> u64 {
    600
}

fn default_page_limit() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path` and applies environment
    /// overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("CASTING_API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CASTING_API_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "CASTING_API_PORT",
            })?;
        }
        if let Ok(url) = std::env::var("CASTING_API_JWKS_URL") {
            self.auth.jwks_url = url;
        }
        Ok(())
    }
}
