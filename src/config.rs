//! Process configuration from environment variables.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8000;

/// Runtime settings derived from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Listen address, `HOST`. Defaults to all interfaces.
    pub host: IpAddr,
    /// Listen port, `PORT`.
    pub port: u16,
    /// `DATABASE_URL`; never echoed back by the API.
    pub database_url: Option<String>,
    /// `DATABASE_NAME`; never echoed back by the API.
    pub database_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} {value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

impl Config {
    /// Loads an optional `.env` file, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from any variable source. Empty values count as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match var("HOST") {
            Some(raw) => raw.trim().parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "HOST",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            database_url: var("DATABASE_URL"),
            database_name: var("DATABASE_NAME"),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
