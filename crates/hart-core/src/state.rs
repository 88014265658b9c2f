// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared poller state.
//!
//! Written by the scheduler, read by the HTTP handlers. Every accessor takes
//! a short `parking_lot` lock and returns a clone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandCatalog};
use crate::device::Device;

/// Lifecycle phase of the polling role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerPhase {
    /// Not started yet.
    #[default]
    Starting,
    /// Running the identification command.
    Identifying,
    /// Cycling the catalog.
    Polling,
    /// Identification failed; polling will not start.
    IdentificationFailed,
    /// Polling has ended.
    Stopped,
}

impl PollerPhase {
    /// Returns the phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PollerPhase::Starting => "starting",
            PollerPhase::Identifying => "identifying",
            PollerPhase::Polling => "polling",
            PollerPhase::IdentificationFailed => "identification_failed",
            PollerPhase::Stopped => "stopped",
        }
    }

    /// Returns `true` once polling can no longer make progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerPhase::IdentificationFailed | PollerPhase::Stopped)
    }
}

impl fmt::Display for PollerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the JSON snapshot served to readers of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotShape {
    /// The device object alone.
    Device,
    /// `[device, [commands...]]`.
    #[default]
    Full,
}

impl SnapshotShape {
    /// Returns the shape name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotShape::Device => "device",
            SnapshotShape::Full => "full",
        }
    }
}

/// Poll statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    /// Completed cycles.
    pub cycles: u64,
    /// Successful executions.
    pub commands_ok: u64,
    /// Failed executions.
    pub commands_failed: u64,
    /// Time of the last execution.
    pub last_poll: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    device: RwLock<Device>,
    commands: RwLock<BTreeMap<u8, Command>>,
    phase: RwLock<PollerPhase>,
    stats: RwLock<PollStats>,
}

/// Cheaply clonable handle to the shared state.
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    inner: Arc<Inner>,
}

impl PollerState {
    /// Creates empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state with a never-executed record for every catalog entry.
    pub fn with_catalog(catalog: &CommandCatalog) -> Self {
        let state = Self::new();
        {
            let mut commands = state.inner.commands.write();
            for kind in catalog.iter() {
                commands.insert(kind.number(), Command::new(kind));
            }
        }
        state
    }

    /// Returns a copy of the device.
    pub fn device(&self) -> Device {
        self.inner.device.read().clone()
    }

    /// Returns the command records ordered by number.
    pub fn commands(&self) -> Vec<Command> {
        self.inner.commands.read().values().cloned().collect()
    }

    /// Returns one command record.
    pub fn command(&self, number: u8) -> Option<Command> {
        self.inner.commands.read().get(&number).cloned()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> PollerPhase {
        *self.inner.phase.read()
    }

    /// Returns the poll statistics.
    pub fn stats(&self) -> PollStats {
        self.inner.stats.read().clone()
    }

    /// Publishes the device and one command record.
    pub fn store(&self, device: &Device, command: &Command) {
        *self.inner.device.write() = device.clone();
        self.inner
            .commands
            .write()
            .insert(command.number(), command.clone());
    }

    /// Sets the phase.
    pub fn set_phase(&self, phase: PollerPhase) {
        *self.inner.phase.write() = phase;
    }

    /// Counts one execution.
    pub fn record_poll(&self, ok: bool, at: DateTime<Utc>) {
        let mut stats = self.inner.stats.write();
        if ok {
            stats.commands_ok += 1;
        } else {
            stats.commands_failed += 1;
        }
        stats.last_poll = Some(at);
    }

    /// Counts one completed cycle.
    pub fn record_cycle(&self) {
        self.inner.stats.write().cycles += 1;
    }
}
