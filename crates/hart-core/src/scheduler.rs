// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command execution scheduler.
//!
//! The scheduler is the only task that talks to the protocol engine. It
//! identifies the device once, then cycles the catalog forever:
//!
//! ```text
//! open (runtime) ──▶ identify ──┬─ ok ──▶ ┌─────── cycle ───────┐
//!                               │         │ execute             │
//!                               │         │ merge into Device   │
//!                               │         │ send / classify     │
//!                               │         │ sleep (cadence)     │◀─┐
//!                               │         └─────────┬───────────┘  │
//!                               │                   └──────────────┘
//!                               └─ err ─▶ close channel, IdentificationFailed
//! ```
//!
//! Every reply is merged into the owned [`Device`] and [`Command`] record and
//! published to [`PollerState`] before the snapshot is sent, so a reader of
//! the result always sees a device at least as new as the result.
//!
//! Shutdown is observed only at sleep points; an in-flight command always
//! completes. The engine is closed when `run` returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::classifier::{ErrorClassifier, FailureRecorder};
use crate::command::{Command, CommandCatalog, CommandKind, ExecutedCommand};
use crate::consumer::ResultSender;
use crate::device::Device;
use crate::engine::ProtocolEngine;
use crate::error::{EngineError, PollerError};
use crate::state::{PollerPhase, PollerState};

// =============================================================================
// Policies
// =============================================================================

/// What a failed steady-state command does to the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, count and continue with the next command.
    #[default]
    FailSoft,
    /// Log, count and stop polling with [`PollerError::CommandFailed`].
    FailFast,
}

impl FailurePolicy {
    /// Returns the policy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailSoft => "fail_soft",
            FailurePolicy::FailFast => "fail_fast",
        }
    }
}

/// How the poll interval is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadencePolicy {
    /// Sleep the full interval after every command.
    FixedDelay(Duration),
    /// Sleep whatever is left of the interval after every cycle.
    CycleBudget(Duration),
}

impl CadencePolicy {
    /// Returns the configured interval.
    pub fn interval(&self) -> Duration {
        match self {
            CadencePolicy::FixedDelay(d) | CadencePolicy::CycleBudget(d) => *d,
        }
    }

    /// Returns the policy name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CadencePolicy::FixedDelay(_) => "fixed_delay",
            CadencePolicy::CycleBudget(_) => "cycle_budget",
        }
    }
}

impl Default for CadencePolicy {
    fn default() -> Self {
        CadencePolicy::CycleBudget(Duration::from_secs(2))
    }
}

/// Time left of a cycle budget, clamped to zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hart_core::scheduler::cycle_sleep;
///
/// assert_eq!(cycle_sleep(Duration::from_secs(2), Duration::from_millis(500)), Duration::from_millis(1500));
/// assert_eq!(cycle_sleep(Duration::from_secs(2), Duration::from_secs(3)), Duration::ZERO);
/// ```
pub fn cycle_sleep(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Scheduler configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerConfig {
    /// Cadence policy.
    pub cadence: CadencePolicy,
    /// Failure policy.
    pub failure_policy: FailurePolicy,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Owns the engine, the device model and the command records.
pub struct Scheduler {
    engine: Box<dyn ProtocolEngine>,
    catalog: CommandCatalog,
    state: PollerState,
    config: SchedulerConfig,
    device: Device,
    commands: HashMap<u8, Command>,
    shutdown: Arc<Notify>,
}

impl Scheduler {
    /// Creates a scheduler over an already opened engine.
    pub fn new(
        engine: Box<dyn ProtocolEngine>,
        catalog: CommandCatalog,
        state: PollerState,
        config: SchedulerConfig,
    ) -> Self {
        let commands = catalog
            .iter()
            .map(|kind| (kind.number(), Command::new(kind)))
            .collect();

        Self {
            engine,
            catalog,
            state,
            config,
            device: Device::new(),
            commands,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Returns a handle that stops the loop at its next sleep point.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Runs the scheduler until shutdown or a terminal error.
    ///
    /// Drops `results` before returning, which ends the result consumer.
    #[instrument(skip_all, name = "scheduler", fields(engine = %self.engine.name()))]
    pub async fn run(
        mut self,
        results: ResultSender,
        failures: Arc<dyn FailureRecorder>,
    ) -> Result<(), PollerError> {
        info!(
            cadence = self.config.cadence.as_str(),
            interval_ms = self.config.cadence.interval().as_millis() as u64,
            failure_policy = self.config.failure_policy.as_str(),
            commands = self.catalog.cycle().len(),
            "Scheduler started"
        );

        let outcome = self.poll(&results, failures.as_ref()).await;
        drop(results);

        if !matches!(outcome, Err(PollerError::Identification { .. })) {
            self.state.set_phase(PollerPhase::Stopped);
        }

        if let Err(e) = self.engine.close().await {
            warn!(error = %e, "Failed to close engine");
        }

        let stats = self.state.stats();
        match &outcome {
            Ok(()) => info!(
                cycles = stats.cycles,
                ok = stats.commands_ok,
                failed = stats.commands_failed,
                "Scheduler stopped"
            ),
            Err(e) => error!(
                error = %e,
                cycles = stats.cycles,
                ok = stats.commands_ok,
                failed = stats.commands_failed,
                "Scheduler stopped"
            ),
        }
        outcome
    }

    async fn poll(
        &mut self,
        results: &ResultSender,
        failures: &dyn FailureRecorder,
    ) -> Result<(), PollerError> {
        self.state.set_phase(PollerPhase::Identifying);

        let identification = self.catalog.identification();
        match self.execute(identification, failures).await {
            Ok(executed) => send(results, executed).await?,
            Err(source) => {
                error!(error = %source, "Device identification failed");
                self.state.set_phase(PollerPhase::IdentificationFailed);
                return Err(PollerError::Identification { source });
            }
        }

        self.state.set_phase(PollerPhase::Polling);
        if let Some(identity) = self.device.identity {
            info!(device = %identity, "Device identified, polling started");
        }

        let cycle = self.catalog.cycle().to_vec();
        loop {
            let started = Instant::now();

            for &kind in &cycle {
                match self.execute(kind, failures).await {
                    Ok(executed) => send(results, executed).await?,
                    Err(source) => match self.config.failure_policy {
                        FailurePolicy::FailSoft => {
                            warn!(command = kind.number(), error = %source, "Command failed");
                        }
                        FailurePolicy::FailFast => {
                            error!(command = kind.number(), error = %source, "Command failed");
                            return Err(PollerError::CommandFailed {
                                command: kind.number(),
                                source,
                            });
                        }
                    },
                }

                if let CadencePolicy::FixedDelay(delay) = self.config.cadence {
                    if self.pause(delay).await {
                        return Ok(());
                    }
                }
            }

            self.state.record_cycle();

            // An empty cycle still waits once per interval under either cadence.
            let remaining = match self.config.cadence {
                CadencePolicy::CycleBudget(interval) => cycle_sleep(interval, started.elapsed()),
                CadencePolicy::FixedDelay(delay) if cycle.is_empty() => delay,
                CadencePolicy::FixedDelay(_) => continue,
            };
            debug!(sleep_ms = remaining.as_millis() as u64, "Cycle complete");
            if self.pause(remaining).await {
                return Ok(());
            }
        }
    }

    /// Executes one command, merges the reply and publishes shared state.
    ///
    /// Failures are classified and counted here; the caller decides whether
    /// polling goes on.
    async fn execute(
        &mut self,
        kind: CommandKind,
        failures: &dyn FailureRecorder,
    ) -> Result<ExecutedCommand, EngineError> {
        let result = self.engine.execute(kind).await;
        let at = Utc::now();
        let command = self
            .commands
            .entry(kind.number())
            .or_insert_with(|| Command::new(kind));

        let outcome = match result {
            Ok(response) => {
                self.device.merge(&response, at);
                Ok(command.record_success(&response, at))
            }
            Err(error) => {
                if let Some(status) = error.device_status() {
                    self.device.merge_status(status, at);
                }
                command.record_failure(&error, at);
                let increments = ErrorClassifier::record(&error, failures);
                debug!(
                    command = kind.number(),
                    error_type = error.error_type(),
                    increments,
                    "Failure recorded"
                );
                Err(error)
            }
        };

        self.state.store(&self.device, command);
        self.state.record_poll(outcome.is_ok(), at);
        outcome
    }

    /// Sleeps for `duration`. Returns `true` if shutdown was requested.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;

            _ = self.shutdown.notified() => {
                info!("Scheduler received shutdown signal");
                true
            }
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

async fn send(results: &ResultSender, executed: ExecutedCommand) -> Result<(), PollerError> {
    results
        .send(executed)
        .await
        .map_err(|_| PollerError::ConsumerClosed)
}

// =============================================================================
// Tests
// =============================================================================
