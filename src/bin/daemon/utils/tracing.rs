//! Tracing Utilities Module
//!
//! This module contains tracing functionality for the qpremote daemon,
//! including logging configuration with optional file output.

use super::error::{QpError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the non-blocking file writer flushing for the whole process lifetime
static WORKER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes the tracing subscriber with console output and, when `log_path`
/// is given, an additional non-blocking file layer.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn setup_tracing(log_path: Option<&Path>, default_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .map_err(|e| {
                    QpError::TracingError(format!("cannot open {}: {}", path.display(), e))
                })?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = WORKER_GUARD.set(guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_filter(env_filter.clone()),
            )
        }
        None => None,
    };

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| QpError::TracingError(e.to_string()))
}
