// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Result consumer.
//!
//! Drains the result channel in send order, logs each result and hands it to
//! the [`TelemetryPublisher`]. Stops when the scheduler drops its sender.
//!
//! ```text
//! ┌────────────┐  ExecutedCommand  ┌────────────────┐        ┌─────────────┐
//! │ Scheduler  │──────────────────▶│ ResultConsumer │───────▶│ HartMetrics │
//! │ (sender)   │   bounded mpsc    │ - log          │publish │ (registry)  │
//! └────────────┘                   └────────────────┘        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let (sender, receiver) = result_channel(1);
//! let consumer = ResultConsumer::new(receiver, TelemetryPublisher::new(metrics));
//! let handle = tokio::spawn(consumer.run());
//! ```

use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::command::ExecutedCommand;
use crate::publisher::{PublishOutcome, TelemetryPublisher};
use crate::types::CommandPayload;

/// Sending half of the result channel.
pub type ResultSender = mpsc::Sender<ExecutedCommand>;

/// Receiving half of the result channel.
pub type ResultReceiver = mpsc::Receiver<ExecutedCommand>;

/// Creates the result channel. A capacity of zero is raised to one.
pub fn result_channel(capacity: usize) -> (ResultSender, ResultReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Counters reported when the consumer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Results received.
    pub received: u64,
    /// Results that wrote gauges.
    pub published: u64,
    /// Results for commands without gauges.
    pub unsupported: u64,
    /// Results dropped because the registry was shut down.
    pub discarded: u64,
}

/// Single consumer of the result channel.
pub struct ResultConsumer {
    receiver: ResultReceiver,
    publisher: TelemetryPublisher,
    stats: ConsumerStats,
}

impl ResultConsumer {
    /// Creates a consumer.
    pub fn new(receiver: ResultReceiver, publisher: TelemetryPublisher) -> Self {
        Self {
            receiver,
            publisher,
            stats: ConsumerStats::default(),
        }
    }

    /// Runs until the channel is closed and drained.
    #[instrument(skip(self), name = "result_consumer")]
    pub async fn run(mut self) -> ConsumerStats {
        info!("Result consumer started");

        while let Some(executed) = self.receiver.recv().await {
            self.process(&executed);
        }

        info!(
            received = self.stats.received,
            published = self.stats.published,
            unsupported = self.stats.unsupported,
            discarded = self.stats.discarded,
            "Result channel closed, consumer stopped"
        );
        self.stats
    }

    fn process(&mut self, executed: &ExecutedCommand) {
        self.stats.received += 1;

        let command = executed.kind.number();
        info!(
            command,
            description = executed.kind.description(),
            status = %executed.status,
            response_code = executed.status.code(),
            payload = executed.payload.name(),
            "Command executed"
        );
        info!(command, device_status = %executed.device_status, "Device status");
        log_payload(command, &executed.payload);

        match self.publisher.publish(executed) {
            PublishOutcome::Published => self.stats.published += 1,
            PublishOutcome::Unsupported => {
                self.stats.unsupported += 1;
                warn!(command, "Unsupported command, result not published");
            }
            PublishOutcome::Disabled => self.stats.discarded += 1,
        }
    }
}

fn log_payload(command: u8, payload: &CommandPayload) {
    match payload {
        CommandPayload::Identity(identity) => {
            info!(
                command,
                manufacturer_id = %identity.manufacturer_label(),
                device_type = %identity.device_type_label(),
                device_id = %identity.device_id_label(),
                "Device identity"
            );
        }
        CommandPayload::PrimaryVariable(pv) => {
            info!(command, pv = %pv, "Primary variable");
        }
        CommandPayload::LoopCurrent {
            current_ma,
            percent_of_range,
        } => {
            info!(command, current_ma, "Loop current");
            info!(command, percent_of_range, "Percent of range");
        }
        CommandPayload::DynamicVariables {
            loop_current_ma,
            pv,
            sv,
            tv,
            fv,
        } => {
            info!(command, loop_current_ma, "Loop current");
            info!(command, pv = %pv, sv = %sv, tv = %tv, fv = %fv, "Dynamic variables");
        }
        CommandPayload::TagDescriptorDate {
            tag,
            descriptor,
            date,
        } => {
            info!(command, tag = %tag, descriptor = %descriptor, date = %date, "Tag, descriptor, date");
        }
        CommandPayload::OutputInformation {
            range_unit,
            upper_range,
            lower_range,
            damping_s,
        } => {
            info!(
                command,
                unit = %range_unit,
                lower_range,
                upper_range,
                "Output range"
            );
            info!(command, damping_s, "Damping");
        }
        CommandPayload::Raw { data } => {
            info!(command, bytes = data.len(), "Raw reply");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::metrics::{HartMetrics, MetricsOptions};
    use crate::status::{CommandStatus, DeviceStatus};
    use crate::types::ProcessVariable;
    use crate::units::UnitCode;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn pv(value: f64) -> ExecutedCommand {
        ExecutedCommand {
            kind: CommandKind::ReadPrimaryVariable,
            status: CommandStatus::Success,
            device_status: DeviceStatus::OK,
            payload: CommandPayload::PrimaryVariable(ProcessVariable::new(value, UnitCode::DEG_C)),
            executed_at: Utc::now(),
        }
    }

    fn consumer(receiver: ResultReceiver) -> (ResultConsumer, Arc<HartMetrics>) {
        let metrics = Arc::new(HartMetrics::new(MetricsOptions::default()).unwrap());
        let publisher = TelemetryPublisher::new(metrics.clone());
        (ResultConsumer::new(receiver, publisher), metrics)
    }

    #[tokio::test]
    async fn test_drains_in_order_then_stops() {
        let (sender, receiver) = result_channel(4);
        let (consumer, metrics) = consumer(receiver);
        let handle = tokio::spawn(consumer.run());

        sender.send(pv(23.5)).await.unwrap();
        sender.send(pv(24.1)).await.unwrap();
        drop(sender);

        let stats = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(stats.received, 2);
        assert_eq!(stats.published, 2);
        assert_eq!(metrics.value("device_pv_value", &[("unit", "degC")]), Some(24.1));
    }

    #[tokio::test]
    async fn test_closed_channel_without_sends() {
        let (sender, receiver) = result_channel(1);
        let (consumer, _) = consumer(receiver);
        drop(sender);

        let stats = timeout(Duration::from_secs(1), consumer.run()).await.unwrap();
        assert_eq!(stats, ConsumerStats::default());
    }

    #[tokio::test]
    async fn test_counts_unsupported_and_discarded() {
        let (sender, receiver) = result_channel(4);
        let (consumer, metrics) = consumer(receiver);

        let mut raw = pv(0.0);
        raw.kind = CommandKind::Unsupported(9);
        raw.payload = CommandPayload::Raw { data: vec![1] };
        sender.send(raw).await.unwrap();
        drop(sender);
        let stats = consumer.run().await;
        assert_eq!(stats.unsupported, 1);

        let (sender, receiver) = result_channel(4);
        let publisher = TelemetryPublisher::new(metrics.clone());
        metrics.shutdown();
        sender.send(pv(1.0)).await.unwrap();
        drop(sender);
        let stats = ResultConsumer::new(receiver, publisher).run().await;
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let (sender, _receiver) = result_channel(0);
        assert_eq!(sender.max_capacity(), 1);
    }
}
