//! Unified Error Handling System
//!
//! This module defines the daemon-level error type. Command-level failures never
//! reach it: they are folded into reply fragments by the command registry.

use std::net::SocketAddr;
use thiserror::Error;

/// Enumeration of all daemon error types
#[derive(Error, Debug)]
pub enum QpError {
    /// The listening socket could not be bound
    #[error("Unable to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The configured host is not a loopback address
    #[error("Refusing to listen on non-loopback address {0}")]
    NotLoopback(String),

    /// The configured host could not be parsed as an IP address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// System I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration file error
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Logging could not be initialized
    #[error("Tracing error: {0}")]
    TracingError(String),
}

impl From<std::net::AddrParseError> for QpError {
    fn from(error: std::net::AddrParseError) -> Self {
        QpError::InvalidAddress(error.to_string())
    }
}

impl From<toml::de::Error> for QpError {
    fn from(error: toml::de::Error) -> Self {
        QpError::ConfigError(error.to_string())
    }
}

/// Standardized result type for the daemon
pub type Result<T> = std::result::Result<T, QpError>;
