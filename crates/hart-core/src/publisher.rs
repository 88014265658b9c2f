// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Telemetry publisher.
//!
//! Maps an [`ExecutedCommand`] onto the metric families of [`HartMetrics`].
//! Status counters move on every dispatch; gauges are overwritten with the
//! decoded values.

use std::sync::Arc;

use tracing::debug;

use crate::command::ExecutedCommand;
use crate::metrics::{HartMetrics, VariableSlot};
use crate::types::CommandPayload;

/// What a publish call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Gauges were written.
    Published,
    /// Only the status counters moved; the command has no gauges.
    Unsupported,
    /// The registry has been shut down; nothing was written.
    Disabled,
}

/// Writes decoded command results into the registry.
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    metrics: Arc<HartMetrics>,
}

impl TelemetryPublisher {
    /// Creates a publisher over a shared registry.
    pub fn new(metrics: Arc<HartMetrics>) -> Self {
        Self { metrics }
    }

    /// Returns the registry.
    pub fn metrics(&self) -> &Arc<HartMetrics> {
        &self.metrics
    }

    /// Publishes one executed command.
    pub fn publish(&self, executed: &ExecutedCommand) -> PublishOutcome {
        let metrics = &self.metrics;
        if !metrics.is_enabled() {
            return PublishOutcome::Disabled;
        }

        metrics.inc_command_status(executed.status);
        metrics.inc_device_status(executed.device_status);

        match &executed.payload {
            CommandPayload::Identity(identity) => {
                metrics.set_device_info(identity);
            }
            CommandPayload::PrimaryVariable(pv) => {
                metrics.set_variable(VariableSlot::Pv, pv);
            }
            CommandPayload::LoopCurrent {
                current_ma,
                percent_of_range,
            } => {
                metrics.set_loop_current(*current_ma);
                metrics.set_percent_of_range(*percent_of_range);
            }
            CommandPayload::DynamicVariables { sv, tv, fv, .. } => {
                // Loop current and PV have dedicated commands.
                metrics.set_variable(VariableSlot::Sv, sv);
                metrics.set_variable(VariableSlot::Tv, tv);
                metrics.set_variable(VariableSlot::Fv, fv);
            }
            CommandPayload::TagDescriptorDate {
                tag,
                descriptor,
                date,
            } => {
                metrics.set_tag_info(tag, descriptor, *date);
            }
            CommandPayload::OutputInformation {
                range_unit,
                upper_range,
                lower_range,
                damping_s,
            } => {
                metrics.set_output_range(*range_unit, *lower_range, *upper_range, *damping_s);
            }
            CommandPayload::Raw { data } => {
                debug!(
                    command = executed.kind.number(),
                    bytes = data.len(),
                    "No metrics for unsupported command"
                );
                return PublishOutcome::Unsupported;
            }
        }

        PublishOutcome::Published
    }
}

// =============================================================================
// Tests
// =============================================================================
