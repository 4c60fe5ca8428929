//! Configuration Module
//!
//! This module provides constants and the TOML-backed configuration for the
//! qpremote daemon.

use crate::utils::error::{QpError, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Constants for default settings
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 1787;
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;
pub const DEFAULT_CONFIG_PATH: &str = ".config/qpremote/config.toml";

/// Literal prepended to every non-empty reply
pub const REPLY_TAG: &str = "qtplot:";

/// Daemon settings as read from `config.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Address to listen on; must be loopback
    pub host: String,
    pub port: u16,
    /// Upper bound on the single chunk read per connection
    pub max_request_size: usize,
    /// Idle timeout for the request read; `None` waits forever
    pub read_timeout_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            read_timeout_ms: None,
            log_file: None,
        }
    }
}

impl DaemonConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.max_request_size == 0 {
            return Err(QpError::ConfigError(
                "max_request_size must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load the configuration file at `path`.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Default config location under the user's home directory
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_PATH))
    }

    /// Resolve the listen address, rejecting anything that is not loopback
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.trim().parse()?;
        if !ip.is_loopback() {
            return Err(QpError::NotLoopback(self.host.clone()));
        }
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.port, 1787);
        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:1787".parse::<SocketAddr>().unwrap()
        );
        assert!(config.read_timeout().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DaemonConfig::from_toml("port = 1800\nread_timeout_ms = 250\n").unwrap();
        assert_eq!(config.port, 1800);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_ipv6_loopback_accepted() {
        let config = DaemonConfig {
            host: "::1".to_string(),
            ..DaemonConfig::default()
        };
        assert!(config.listen_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn test_non_loopback_rejected() {
        let config = DaemonConfig {
            host: "0.0.0.0".to_string(),
            ..DaemonConfig::default()
        };
        match config.listen_addr() {
            Err(QpError::NotLoopback(host)) => assert_eq!(host, "0.0.0.0"),
            other => panic!("Expected NotLoopback, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            DaemonConfig::from_toml("colour = \"red\""),
            Err(QpError::ConfigError(_))
        ));
    }

    #[test]
    fn test_zero_request_size_rejected() {
        assert!(DaemonConfig::from_toml("max_request_size = 0").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DaemonConfig::default());
    }
}
