// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol engine abstraction.
//!
//! The engine owns the byte channel to the field device and turns a
//! [`CommandKind`] into a decoded [`Response`]. Frame encoding, checksums and
//! serial line settings live behind this trait.
//!
//! # Lifecycle
//!
//! 1. `open(channel)` once at startup; a failure is fatal
//! 2. `execute(command)` repeatedly, one outstanding request at a time
//! 3. `close()` when the scheduler exits
//!
//! # Example
//!
//! ```rust,ignore
//! async fn identify(engine: &mut dyn ProtocolEngine) -> Result<(), EngineError> {
//!     engine.open("/dev/ttyUSB0").await?;
//!     let response = engine.execute(CommandKind::ReadUniqueIdentifier).await?;
//!     println!("device status: {}", response.device_status);
//!     engine.close().await
//! }
//! ```

use async_trait::async_trait;

use crate::command::CommandKind;
use crate::error::EngineResult;
use crate::status::{CommandStatus, DeviceStatus};
use crate::types::CommandPayload;

// =============================================================================
// Response
// =============================================================================

/// Immutable snapshot of one successful reply.
///
/// Error-class command statuses never produce a `Response`; engines return
/// [`EngineError::CommandRejected`](crate::error::EngineError::CommandRejected)
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Command status (success or a data-carrying warning).
    pub status: CommandStatus,
    /// Field device status.
    pub device_status: DeviceStatus,
    /// Decoded data.
    pub payload: CommandPayload,
}

impl Response {
    /// Creates a successful response with an all-clear device status.
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            status: CommandStatus::Success,
            device_status: DeviceStatus::OK,
            payload,
        }
    }

    /// Sets the command status.
    pub fn with_status(mut self, status: CommandStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the device status.
    pub fn with_device_status(mut self, device_status: DeviceStatus) -> Self {
        self.device_status = device_status;
        self
    }
}

// =============================================================================
// ProtocolEngine Trait
// =============================================================================

/// A request/response engine bound to one field device.
///
/// `execute` takes `&mut self`: the protocol allows a single outstanding
/// request, and the scheduler is the only caller.
#[async_trait]
pub trait ProtocolEngine: Send + Sync {
    /// Returns the engine name for logging.
    fn name(&self) -> &str;

    /// Opens the byte channel.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::OpenFailed` if the channel cannot be opened.
    async fn open(&mut self, channel: &str) -> EngineResult<()>;

    /// Closes the byte channel. Closing a closed engine is a no-op.
    async fn close(&mut self) -> EngineResult<()>;

    /// Returns `true` while the channel is open.
    fn is_open(&self) -> bool;

    /// Executes one command and decodes the reply.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotOpen` - `open` has not succeeded
    /// - `EngineError::Communication` - composite fault flags
    /// - `EngineError::CommandRejected` - error-class command status
    /// - `EngineError::Timeout` / `EngineError::Transport` - link failures
    async fn execute(&mut self, command: CommandKind) -> EngineResult<Response>;
}

// =============================================================================
// Tests
// =============================================================================
