// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hart-core
//!
//! Polling and telemetry pipeline for a HART field instrument.
//!
//! This crate provides:
//!
//! - **Types**: status bytes, unit codes, decoded command payloads
//! - **Command**: command kinds, per-command records, the polling catalog
//! - **Device**: the device model merged from every reply
//! - **Engine**: the protocol engine trait and a simulated transmitter
//! - **Scheduler**: identification, steady-state cycling, cadence, failure policy
//! - **Classifier**: composite / plain error decomposition
//! - **Consumer / Publisher / Metrics**: result channel to Prometheus registry
//! - **State**: shared snapshot read by the HTTP endpoint
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hart_core::{
//!     result_channel, CommandCatalog, HartMetrics, MetricsOptions, PollerState,
//!     ResultConsumer, Scheduler, SchedulerConfig, SimulatedEngine, TelemetryPublisher,
//! };
//!
//! let metrics = Arc::new(HartMetrics::new(MetricsOptions::default())?);
//! let catalog = CommandCatalog::default();
//! let state = PollerState::with_catalog(&catalog);
//!
//! let mut engine = SimulatedEngine::new(Default::default());
//! engine.open("/dev/ttyUSB0").await?;
//!
//! let (sender, receiver) = result_channel(1);
//! let scheduler = Scheduler::new(Box::new(engine), catalog, state, SchedulerConfig::default());
//! tokio::spawn(ResultConsumer::new(receiver, TelemetryPublisher::new(metrics.clone())).run());
//! scheduler.run(sender, metrics).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod status;
pub mod types;
pub mod units;

// =============================================================================
// Device & Engine Modules
// =============================================================================

pub mod command;
pub mod device;
pub mod engine;
pub mod simulator;

// =============================================================================
// Pipeline Modules
// =============================================================================

pub mod classifier;
pub mod consumer;
pub mod metrics;
pub mod publisher;
pub mod scheduler;
pub mod state;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::*;

pub use classifier::{Classification, ErrorClassifier, FailureRecorder};
pub use command::{Command, CommandCatalog, CommandKind, ExecutedCommand};
pub use consumer::{result_channel, ConsumerStats, ResultConsumer, ResultReceiver, ResultSender};
pub use device::{Device, OutputRange};
pub use engine::{ProtocolEngine, Response};
pub use metrics::{HartMetrics, MetricsOptions};
pub use publisher::{PublishOutcome, TelemetryPublisher};
pub use scheduler::{cycle_sleep, CadencePolicy, FailurePolicy, Scheduler, SchedulerConfig};
pub use simulator::{SimulatedEngine, SimulatorOptions};
pub use state::{PollStats, PollerPhase, PollerState, SnapshotShape};
pub use status::{CommErrorFlag, CommErrorFlags, CommandStatus, DeviceStatus};
pub use types::{CommandPayload, DeviceIdentity, ProcessVariable};
pub use units::UnitCode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
