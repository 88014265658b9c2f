// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the HART poller.
//!
//! # Error Types
//!
//! ```text
//! EngineError    - Protocol engine / transport failures for a single command
//! PollerError    - Conditions that end the polling role (handed to the supervisor)
//! MetricsError   - Metrics registry construction and encoding
//! ```
//!
//! `EngineError` is the only type that crosses the protocol engine boundary.
//! A communication failure carries a [`CommErrorFlags`] set that the error
//! classifier decomposes bit by bit; every other variant is a plain error
//! that is counted by its description.
//!
//! # Examples
//!
//! ```
//! use hart_core::error::EngineError;
//! use hart_core::status::CommErrorFlags;
//!
//! let err = EngineError::communication(CommErrorFlags::FRAMING_ERROR | CommErrorFlags::OVERRUN);
//! assert_eq!(err.comm_flags().map(|f| f.count()), Some(2));
//! assert_eq!(err.error_type(), "communication");
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::status::{CommErrorFlags, CommandStatus, DeviceStatus};

// =============================================================================
// EngineError
// =============================================================================

/// Errors returned by a [`ProtocolEngine`](crate::engine::ProtocolEngine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The byte channel could not be opened.
    #[error("Failed to open channel '{channel}': {message}")]
    OpenFailed {
        /// Channel name (serial port).
        channel: String,
        /// Error message.
        message: String,
    },

    /// A command was issued before `open` succeeded.
    #[error("Channel is not open")]
    NotOpen,

    /// The device did not answer in time.
    #[error("No response after {duration:?}")]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
    },

    /// Composite communication fault reported by the device or the link.
    #[error("Communication error: {flags}")]
    Communication {
        /// The set of simultaneous fault bits.
        flags: CommErrorFlags,
    },

    /// The device answered with an error-class command status.
    #[error("Command {command} rejected: {status}")]
    CommandRejected {
        /// Command number.
        command: u8,
        /// Response code returned by the device.
        status: CommandStatus,
        /// Device status byte carried by the same response.
        device_status: DeviceStatus,
    },

    /// The response could not be decoded.
    #[error("Invalid response to command {command}: {message}")]
    InvalidResponse {
        /// Command number.
        command: u8,
        /// Error message.
        message: String,
    },

    /// Transport-level I/O failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl EngineError {
    /// Creates an open failure.
    pub fn open_failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates a composite communication error.
    pub fn communication(flags: CommErrorFlags) -> Self {
        Self::Communication { flags }
    }

    /// Creates a command rejection.
    pub fn rejected(command: u8, status: CommandStatus, device_status: DeviceStatus) -> Self {
        Self::CommandRejected {
            command,
            status,
            device_status,
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(command: u8, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            command,
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the composite fault flags if this error carries them.
    pub fn comm_flags(&self) -> Option<CommErrorFlags> {
        match self {
            EngineError::Communication { flags } => Some(*flags),
            _ => None,
        }
    }

    /// Returns `true` if the composite flag `flag` is set.
    pub fn has_comm_flag(&self, flag: CommErrorFlags) -> bool {
        self.comm_flags().is_some_and(|flags| flags.contains(flag))
    }

    /// Returns the device status carried by the failed response, if any.
    pub fn device_status(&self) -> Option<DeviceStatus> {
        match self {
            EngineError::CommandRejected { device_status, .. } => Some(*device_status),
            _ => None,
        }
    }

    /// Returns the error type for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            EngineError::OpenFailed { .. } => "open_failed",
            EngineError::NotOpen => "not_open",
            EngineError::Timeout { .. } => "timeout",
            EngineError::Communication { .. } => "communication",
            EngineError::CommandRejected { .. } => "command_rejected",
            EngineError::InvalidResponse { .. } => "invalid_response",
            EngineError::Transport { .. } => "transport",
        }
    }
}

// =============================================================================
// PollerError
// =============================================================================

/// Conditions that terminate the polling role.
///
/// The scheduler never decides whether the process exits; it returns one of
/// these and the runtime supervisor applies the deployment profile.
#[derive(Debug, Error)]
pub enum PollerError {
    /// The identification command failed; the device identity is unknown.
    #[error("Identification failed: {source}")]
    Identification {
        /// The engine error.
        #[source]
        source: EngineError,
    },

    /// A command failed under the fail-fast policy.
    #[error("Command {command} failed: {source}")]
    CommandFailed {
        /// Command number.
        command: u8,
        /// The engine error.
        #[source]
        source: EngineError,
    },

    /// The result consumer dropped its receiver.
    #[error("Result consumer is gone")]
    ConsumerClosed,
}

impl PollerError {
    /// Returns `true` if the failure happened during bootstrap.
    pub fn is_identification(&self) -> bool {
        matches!(self, PollerError::Identification { .. })
    }
}

// =============================================================================
// MetricsError
// =============================================================================

/// Metrics registry errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A collector could not be created or registered.
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    /// The registry could not be rendered.
    #[error("Failed to encode metrics: {message}")]
    Encode {
        /// Error message.
        message: String,
    },
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result alias for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comm_flags_query() {
        let err = EngineError::communication(CommErrorFlags::FRAMING_ERROR);
        assert!(err.has_comm_flag(CommErrorFlags::FRAMING_ERROR));
        assert!(!err.has_comm_flag(CommErrorFlags::OVERRUN));

        let plain = EngineError::timeout(Duration::from_millis(500));
        assert!(plain.comm_flags().is_none());
        assert!(!plain.has_comm_flag(CommErrorFlags::FRAMING_ERROR));
    }

    #[test]
    fn test_device_status_from_rejection() {
        let err = EngineError::rejected(1, CommandStatus::Busy, DeviceStatus::COLD_START);
        assert_eq!(err.device_status(), Some(DeviceStatus::COLD_START));
        assert_eq!(err.to_string(), "Command 1 rejected: busy");
        assert!(EngineError::NotOpen.device_status().is_none());
    }

    #[test]
    fn test_error_types() {
        assert_eq!(EngineError::NotOpen.error_type(), "not_open");
        assert_eq!(EngineError::transport("eof").error_type(), "transport");
        assert_eq!(
            EngineError::open_failed("/dev/ttyUSB0", "no such device").to_string(),
            "Failed to open channel '/dev/ttyUSB0': no such device"
        );
    }

    #[test]
    fn test_poller_error_kind() {
        let err = PollerError::Identification {
            source: EngineError::timeout(Duration::from_secs(1)),
        };
        assert!(err.is_identification());
        assert!(!PollerError::ConsumerClosed.is_identification());
    }
}
