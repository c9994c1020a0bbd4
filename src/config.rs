//! Server configuration parsed from environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3132;
pub const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is set but is not a valid TCP port.
    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub dist_dir: PathBuf,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: listening port, default 3132
    /// - `DIST_DIR`: directory holding the built frontend, default `dist`
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::var("PORT").ok().as_deref(), std::env::var("DIST_DIR").ok().as_deref())
    }

    fn from_vars(port: Option<&str>, dist_dir: Option<&str>) -> Result<Self, ConfigError> {
        let port = match non_empty(port) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw.to_string()))?,
            None => DEFAULT_PORT,
        };
        let dist_dir = PathBuf::from(non_empty(dist_dir).unwrap_or(DEFAULT_DIST_DIR));
        Ok(Self { port, dist_dir })
    }

    /// Address to bind: all interfaces on the configured port.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
