// Test suite for the utils module
// This file contains tests for the daemon error type and tracing setup.

use crate::utils::error::{QpError, Result};

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::io;
    use std::net::SocketAddr;

    /// Test the bind error carries address and cause
    #[test]
    fn test_bind_error_display() {
        let addr: SocketAddr = "127.0.0.1:1787".parse().unwrap();
        let error = QpError::Bind {
            addr,
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            format!("{}", error),
            "Unable to bind 127.0.0.1:1787: address in use"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    /// Test conversion from std::io::Error
    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: QpError = io_error.into();
        match error {
            QpError::IoError(_) => (),
            _ => panic!("Expected IoError"),
        }
    }

    /// Test conversion from an unparsable address
    #[test]
    fn test_addr_parse_error_conversion() {
        let parse_error = "localhost".parse::<std::net::IpAddr>().unwrap_err();
        let error: QpError = parse_error.into();
        assert!(matches!(error, QpError::InvalidAddress(_)));
    }

    /// Test conversion from TOML deserialization error
    #[test]
    fn test_toml_de_error_conversion() {
        let result: std::result::Result<toml::Value, toml::de::Error> =
            toml::from_str("invalid toml [");
        let error: QpError = result.unwrap_err().into();
        assert!(matches!(error, QpError::ConfigError(_)));
    }

    /// Test error message formatting
    #[test]
    fn test_error_formatting() {
        let error_cases = vec![
            (
                QpError::NotLoopback("10.0.0.1".to_string()),
                "Refusing to listen on non-loopback address 10.0.0.1",
            ),
            (
                QpError::InvalidAddress("bad".to_string()),
                "Invalid address: bad",
            ),
            (QpError::ConfigError("oops".to_string()), "Config error: oops"),
            (
                QpError::TracingError("twice".to_string()),
                "Tracing error: twice",
            ),
        ];

        for (error, expected) in error_cases {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<u16> {
            Ok(1787)
        }
        assert_eq!(returns_result().unwrap(), 1787);
    }
}

#[cfg(test)]
mod tracing_tests {
    use super::*;
    use crate::utils::tracing::setup_tracing;

    /// An unwritable log path is reported instead of panicking
    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("qpremote.log");
        match setup_tracing(Some(&path), "info") {
            Err(QpError::TracingError(msg)) => assert!(msg.contains("qpremote.log")),
            other => panic!("Expected TracingError, got {:?}", other),
        }
    }
}
