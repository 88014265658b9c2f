// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Pipeline Harness
//!
//! Wires a [`MockEngine`] through the scheduler, the result channel, the
//! consumer and a fresh registry, the same way the exporter runtime does.
//! Use it under `#[tokio::test(start_paused = true)]` so cadence sleeps
//! complete instantly.

use std::sync::Arc;
use std::time::Duration;

use hart_core::{
    result_channel, CadencePolicy, CommandCatalog, ConsumerStats, FailurePolicy, FailureRecorder,
    HartMetrics, MetricsOptions, PollerError, PollerState, ProtocolEngine, ResultConsumer,
    Scheduler, SchedulerConfig, TelemetryPublisher,
};

use super::mocks::MockEngine;

/// What one pipeline run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Scheduler result.
    pub result: Result<(), PollerError>,
    /// Consumer statistics after the channel closed.
    pub consumer: ConsumerStats,
}

/// Scheduler and consumer over a shared registry and state.
pub struct Pipeline {
    /// Registry written by the consumer and the classifier.
    pub metrics: Arc<HartMetrics>,
    /// State written by the scheduler.
    pub state: PollerState,
    /// Handle on the scripted engine.
    pub engine: MockEngine,
    catalog: CommandCatalog,
    config: SchedulerConfig,
    capacity: usize,
}

impl Pipeline {
    /// Default catalog, 2 s cycle budget, fail-soft.
    pub fn new(engine: MockEngine) -> Self {
        let catalog = CommandCatalog::default();
        Self {
            metrics: Arc::new(
                HartMetrics::new(MetricsOptions::default()).expect("registry should build"),
            ),
            state: PollerState::with_catalog(&catalog),
            engine,
            catalog,
            config: SchedulerConfig::default(),
            capacity: 1,
        }
    }

    /// Polls these command numbers instead of the default catalog.
    pub fn with_commands(mut self, numbers: &[u8]) -> Self {
        self.catalog = CommandCatalog::from_numbers(numbers);
        self.state = PollerState::with_catalog(&self.catalog);
        self
    }

    /// Sets the cadence.
    pub fn with_cadence(mut self, cadence: CadencePolicy) -> Self {
        self.config.cadence = cadence;
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Sets the result channel capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Runs until the scheduler returns on its own.
    pub async fn run_to_end(&self) -> PipelineOutcome {
        self.run(None).await
    }

    /// Runs for `duration` of (tokio) time, then requests shutdown.
    pub async fn run_for(&self, duration: Duration) -> PipelineOutcome {
        self.run(Some(duration)).await
    }

    async fn run(&self, stop_after: Option<Duration>) -> PipelineOutcome {
        let mut engine = self.engine.clone();
        engine.open("mock0").await.expect("mock engine should open");

        let (sender, receiver) = result_channel(self.capacity);
        let consumer = tokio::spawn(
            ResultConsumer::new(receiver, TelemetryPublisher::new(self.metrics.clone())).run(),
        );

        let scheduler = Scheduler::new(
            Box::new(engine),
            self.catalog.clone(),
            self.state.clone(),
            self.config,
        );
        let stop = scheduler.shutdown_handle();
        let failures: Arc<dyn FailureRecorder> = self.metrics.clone();
        let poller = tokio::spawn(scheduler.run(sender, failures));

        if let Some(duration) = stop_after {
            tokio::time::sleep(duration).await;
            stop.notify_one();
        }

        let result = poller.await.expect("scheduler task panicked");
        let consumer = consumer.await.expect("consumer task panicked");
        PipelineOutcome { result, consumer }
    }
}
