//! Process settings read from the environment (and an optional `.env` file).
//!
//! | variable              | default     |
//! |-----------------------|-------------|
//! | `FUNDMATCH_HOST`      | `127.0.0.1` |
//! | `FUNDMATCH_PORT`      | `8080`      |
//! | `FUNDMATCH_LOG_LEVEL` | `info`      |
//! | `FUNDMATCH_CATALOG`   | embedded    |
//! | `FUNDMATCH_RULES`     | built-in    |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub telemetry: TelemetrySettings,
    pub catalog_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("FUNDMATCH_PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),
    #[error("host '{host}' must be localhost or an IPv4/IPv6 address")]
    InvalidHost { host: String },
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let host = lookup("FUNDMATCH_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match lookup("FUNDMATCH_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| SettingsError::InvalidPort(raw.clone()))?,
            None => 8080,
        };
        let log_level = lookup("FUNDMATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };

        Ok(Self {
            server: ServerSettings { host, port },
            telemetry: TelemetrySettings { log_level },
            catalog_path: path("FUNDMATCH_CATALOG"),
            rules_path: path("FUNDMATCH_RULES"),
        })
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self.host.parse().map_err(|_| SettingsError::InvalidHost {
            host: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
