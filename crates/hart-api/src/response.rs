// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use hart_core::{PollStats, PollerPhase, PollerState};
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` while the poller can make progress, `unavailable` otherwise.
    pub status: &'static str,
    /// Poller phase.
    pub phase: PollerPhase,
    /// Identified device, as `manufacturer/type/id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Poll statistics.
    pub stats: PollStats,
    /// Exporter version.
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
}

impl HealthResponse {
    /// Builds the response from the shared poller state.
    pub fn from_state(poller: &PollerState, uptime_seconds: u64) -> Self {
        let phase = poller.phase();
        Self {
            status: if phase.is_terminal() { "unavailable" } else { "ok" },
            phase,
            device: poller.device().identity.map(|identity| identity.to_string()),
            stats: poller.stats(),
            version: crate::VERSION,
            uptime_seconds,
        }
    }

    /// Returns `true` if the status is `ok`.
    pub fn is_healthy(&self) -> bool {
        !self.phase.is_terminal()
    }
}
