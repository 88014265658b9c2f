// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command catalog and per-command records.
//!
//! - [`CommandKind`]: closed set of commands the poller knows how to decode
//! - [`Command`]: the scheduler-owned record of one command's last execution
//! - [`ExecutedCommand`]: the snapshot handed to the result consumer
//! - [`CommandCatalog`]: the identification command plus the ordered cycle

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::engine::Response;
use crate::error::EngineError;
use crate::status::{CommandStatus, DeviceStatus};
use crate::types::CommandPayload;

// =============================================================================
// CommandKind
// =============================================================================

/// A HART command known to the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Command 0.
    ReadUniqueIdentifier,
    /// Command 1.
    ReadPrimaryVariable,
    /// Command 2.
    ReadLoopCurrentAndPercentOfRange,
    /// Command 3.
    ReadDynamicVariables,
    /// Command 13.
    ReadTagDescriptorDate,
    /// Command 15.
    ReadOutputInformation,
    /// Any other command number. Executed, but never published.
    Unsupported(u8),
}

impl CommandKind {
    /// Commands with a typed decoder.
    pub const SUPPORTED: [CommandKind; 6] = [
        CommandKind::ReadUniqueIdentifier,
        CommandKind::ReadPrimaryVariable,
        CommandKind::ReadLoopCurrentAndPercentOfRange,
        CommandKind::ReadDynamicVariables,
        CommandKind::ReadTagDescriptorDate,
        CommandKind::ReadOutputInformation,
    ];

    /// Maps a command number to its kind.
    pub const fn from_number(number: u8) -> Self {
        match number {
            0 => CommandKind::ReadUniqueIdentifier,
            1 => CommandKind::ReadPrimaryVariable,
            2 => CommandKind::ReadLoopCurrentAndPercentOfRange,
            3 => CommandKind::ReadDynamicVariables,
            13 => CommandKind::ReadTagDescriptorDate,
            15 => CommandKind::ReadOutputInformation,
            other => CommandKind::Unsupported(other),
        }
    }

    /// Returns the command number.
    pub const fn number(self) -> u8 {
        match self {
            CommandKind::ReadUniqueIdentifier => 0,
            CommandKind::ReadPrimaryVariable => 1,
            CommandKind::ReadLoopCurrentAndPercentOfRange => 2,
            CommandKind::ReadDynamicVariables => 3,
            CommandKind::ReadTagDescriptorDate => 13,
            CommandKind::ReadOutputInformation => 15,
            CommandKind::Unsupported(number) => number,
        }
    }

    /// Returns a human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            CommandKind::ReadUniqueIdentifier => "Read Unique Identifier",
            CommandKind::ReadPrimaryVariable => "Read Primary Variable",
            CommandKind::ReadLoopCurrentAndPercentOfRange => {
                "Read Loop Current And Percent Of Range"
            }
            CommandKind::ReadDynamicVariables => "Read Dynamic Variables And Loop Current",
            CommandKind::ReadTagDescriptorDate => "Read Tag, Descriptor, Date",
            CommandKind::ReadOutputInformation => "Read Primary Variable Transducer Information",
            CommandKind::Unsupported(_) => "Unsupported Command",
        }
    }

    /// Returns `true` if the command has a typed decoder.
    pub const fn is_supported(self) -> bool {
        !matches!(self, CommandKind::Unsupported(_))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.number(), self.description())
    }
}

impl Serialize for CommandKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

// =============================================================================
// Command
// =============================================================================

/// The scheduler's record of a command.
///
/// Holds the latest decoded payload and status. Only the scheduler mutates
/// it; readers get clones.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    #[serde(rename = "number")]
    kind: CommandKind,
    description: &'static str,
    payload: Option<CommandPayload>,
    status: Option<CommandStatus>,
    device_status: DeviceStatus,
    last_error: Option<String>,
    executed_at: Option<DateTime<Utc>>,
    successes: u64,
    failures: u64,
}

impl Command {
    /// Creates a record that has never been executed.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            description: kind.description(),
            payload: None,
            status: None,
            device_status: DeviceStatus::OK,
            last_error: None,
            executed_at: None,
            successes: 0,
            failures: 0,
        }
    }

    /// Returns the command kind.
    #[inline]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Returns the command number.
    #[inline]
    pub fn number(&self) -> u8 {
        self.kind.number()
    }

    /// Returns the latest decoded payload.
    pub fn payload(&self) -> Option<&CommandPayload> {
        self.payload.as_ref()
    }

    /// Returns the latest command status.
    pub fn status(&self) -> Option<CommandStatus> {
        self.status
    }

    /// Returns the latest error description.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns when the command was last executed.
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    /// Number of successful executions.
    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Number of failed executions.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Records a successful execution and returns the snapshot to hand off.
    pub fn record_success(&mut self, response: &Response, at: DateTime<Utc>) -> ExecutedCommand {
        self.payload = Some(response.payload.clone());
        self.status = Some(response.status);
        self.device_status = response.device_status;
        self.last_error = None;
        self.executed_at = Some(at);
        self.successes += 1;

        ExecutedCommand {
            kind: self.kind,
            status: response.status,
            device_status: response.device_status,
            payload: response.payload.clone(),
            executed_at: at,
        }
    }

    /// Records a failed execution. The previous payload is kept.
    pub fn record_failure(&mut self, error: &EngineError, at: DateTime<Utc>) {
        if let EngineError::CommandRejected {
            status,
            device_status,
            ..
        } = error
        {
            self.status = Some(*status);
            self.device_status = *device_status;
        }
        self.last_error = Some(error.to_string());
        self.executed_at = Some(at);
        self.failures += 1;
    }
}

// =============================================================================
// ExecutedCommand
// =============================================================================

/// Snapshot of a successful execution, sent over the result channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCommand {
    /// The command kind.
    pub kind: CommandKind,
    /// Command status of the reply.
    pub status: CommandStatus,
    /// Device status of the reply.
    pub device_status: DeviceStatus,
    /// Decoded data.
    pub payload: CommandPayload,
    /// Execution time.
    pub executed_at: DateTime<Utc>,
}

// =============================================================================
// CommandCatalog
// =============================================================================

/// The identification command followed by the ordered polling cycle.
///
/// # Examples
///
/// ```
/// use hart_core::command::{CommandCatalog, CommandKind};
///
/// let catalog = CommandCatalog::from_numbers(&[1, 2, 3]);
/// assert_eq!(catalog.identification(), CommandKind::ReadUniqueIdentifier);
/// assert_eq!(catalog.cycle().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCatalog {
    identification: CommandKind,
    cycle: Vec<CommandKind>,
}

impl CommandCatalog {
    /// Creates a catalog with the given polling cycle.
    pub fn new(cycle: Vec<CommandKind>) -> Self {
        Self {
            identification: CommandKind::ReadUniqueIdentifier,
            cycle,
        }
    }

    /// Creates a catalog from command numbers.
    pub fn from_numbers(numbers: &[u8]) -> Self {
        Self::new(numbers.iter().copied().map(CommandKind::from_number).collect())
    }

    /// Returns the bootstrap command.
    pub fn identification(&self) -> CommandKind {
        self.identification
    }

    /// Returns the steady-state cycle in order.
    pub fn cycle(&self) -> &[CommandKind] {
        &self.cycle
    }

    /// Iterates over every command, identification first.
    pub fn iter(&self) -> impl Iterator<Item = CommandKind> + '_ {
        std::iter::once(self.identification).chain(self.cycle.iter().copied())
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new(vec![
            CommandKind::ReadPrimaryVariable,
            CommandKind::ReadLoopCurrentAndPercentOfRange,
            CommandKind::ReadDynamicVariables,
            CommandKind::ReadTagDescriptorDate,
            CommandKind::ReadOutputInformation,
        ])
    }
}

// =============================================================================
// Tests
// =============================================================================
