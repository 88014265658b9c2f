// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the exporter binary.

use hart_core::{EngineError, MetricsError, PollerError};
use thiserror::Error;

/// Result type alias for hart-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can end the exporter process.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// HTTP endpoint error.
    #[error("API error: {0}")]
    Api(#[from] hart_api::ApiError),

    /// Config loading error.
    #[error("Config error: {0}")]
    Config(#[from] hart_config::ConfigError),

    /// The protocol engine could not be opened or closed.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The polling loop ended with an error.
    #[error("Poller error: {0}")]
    Poller(#[from] PollerError),

    /// The metrics registry could not be built.
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Initialization(_) | Self::Metrics(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Api(_) => 5,
            Self::Engine(_) => 6,
            Self::Poller(e) if e.is_identification() => 7,
            Self::Poller(_) => 8,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{err:#}"))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Prints an error and its cause chain to stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with its exit code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_with_context() {
        let err = BinError::config("inner error").with_context("outer context");
        assert_eq!(err.to_string(), "outer context: Configuration error: inner error");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::config("test").exit_code(), 1);
        assert_eq!(BinError::init("test").exit_code(), 2);
        assert_eq!(BinError::runtime("test").exit_code(), 3);
        assert_eq!(
            BinError::from(std::io::Error::new(std::io::ErrorKind::Other, "x")).exit_code(),
            4
        );
        assert_eq!(BinError::from(EngineError::NotOpen).exit_code(), 6);
    }

    #[test]
    fn test_poller_exit_codes() {
        let identification = PollerError::Identification {
            source: EngineError::timeout(Duration::from_millis(500)),
        };
        assert_eq!(BinError::from(identification).exit_code(), 7);
        assert_eq!(BinError::from(PollerError::ConsumerClosed).exit_code(), 8);
    }

    #[test]
    fn test_anyhow_keeps_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        assert_eq!(BinError::from(err).to_string(), "Runtime error: outer: inner");
    }
}
