// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Exporter runtime orchestration.
//!
//! ```text
//!                 ┌──────────────┐  ExecutedCommand   ┌────────────────┐
//!   engine ──────▶│  Scheduler   │───── channel ─────▶│ ResultConsumer │
//!                 └──────┬───────┘                    └───────┬────────┘
//!                        │ PollerState                        │ HartMetrics
//!                        ▼                                    ▼
//!                 ┌──────────────────────────────────────────────────┐
//!                 │          ApiServer (/hart, /metrics, /health)     │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! The runtime opens the engine, spawns the two pipeline tasks and the HTTP
//! server, and decides what a terminal [`PollerError`] means for the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use hart_api::{ApiResult, ApiServer, ServerConfig};
use hart_config::{load_config, DeviceConfig, EngineKind, HartConfig};
use hart_core::{
    result_channel, ConsumerStats, FailureRecorder, HartMetrics, MetricsOptions, PollerError,
    PollerState, ProtocolEngine, ResultConsumer, Scheduler, SimulatedEngine, TelemetryPublisher,
};

use crate::error::{BinError, BinResult};
use crate::shutdown::{ShutdownCoordinator, ShutdownGuard};

// =============================================================================
// ExporterRuntime
// =============================================================================

/// Runs one poller and its HTTP endpoint until shutdown.
pub struct ExporterRuntime {
    config: Arc<HartConfig>,
    engine: Option<Box<dyn ProtocolEngine>>,
    shutdown: ShutdownCoordinator,
}

impl ExporterRuntime {
    /// Creates a runtime for a validated configuration.
    pub fn new(config: HartConfig) -> Self {
        Self {
            config: Arc::new(config),
            engine: None,
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Uses `engine` instead of the one named by `device.engine`.
    pub fn with_engine(mut self, engine: Box<dyn ProtocolEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HartConfig {
        &self.config
    }

    /// Returns a handle that can stop the runtime.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs until shutdown is signaled or polling ends with a fatal error.
    pub async fn run(mut self) -> BinResult<()> {
        info!(version = hart_core::VERSION, "Starting HART exporter");

        let metrics = Arc::new(
            HartMetrics::new(
                MetricsOptions::default()
                    .with_namespace(self.config.metrics.namespace.clone())
                    .with_version(hart_core::VERSION),
            )
            .map_err(|e| BinError::from(e).with_context("Failed to create metrics registry"))?,
        );

        let catalog = self.config.poller.catalog();
        let state = PollerState::with_catalog(&catalog);

        // Bind before opening the device so a busy port fails fast.
        let api = if self.config.api.enabled {
            let server = ApiServer::builder()
                .config(
                    ServerConfig::new(self.config.api.socket_addr())
                        .with_snapshot(self.config.api.snapshot),
                )
                .poller(state.clone())
                .metrics(metrics.clone())
                .build()?;
            let listener = server.bind().await?;
            Some((server, listener))
        } else {
            info!("HTTP endpoint disabled");
            None
        };

        let mut engine = match self.engine.take() {
            Some(engine) => engine,
            None => create_engine(&self.config.device),
        };
        engine.open(&self.config.device.port).await.map_err(|e| {
            BinError::from(e).with_context(format!("Failed to open {}", self.config.device.port))
        })?;
        info!(
            engine = engine.name(),
            port = %self.config.device.port,
            "Protocol engine opened"
        );

        let (sender, receiver) = result_channel(self.config.poller.channel_capacity);
        let consumer = {
            let consumer = ResultConsumer::new(receiver, TelemetryPublisher::new(metrics.clone()));
            let guard = ShutdownGuard::new(self.shutdown.clone());
            tokio::spawn(async move {
                let stats = consumer.run().await;
                guard.disarm();
                stats
            })
        };

        let scheduler = Scheduler::new(
            engine,
            catalog,
            state,
            self.config.poller.scheduler_config(),
        );
        let stop = scheduler.shutdown_handle();
        let failures: Arc<dyn FailureRecorder> = metrics.clone();
        let poller = tokio::spawn(scheduler.run(sender, failures));

        let server = api.map(|(server, listener)| {
            let signal = self.shutdown.shutdown_signal();
            tokio::spawn(server.serve(listener, signal.wait()))
        });

        info!(
            api = self.config.api.enabled,
            listen = %self.config.api.socket_addr(),
            "HART exporter is ready"
        );

        let result = self.supervise(poller, stop, server).await;

        match consumer.await {
            Ok(stats) => log_consumer_stats(&stats),
            Err(e) => warn!(error = %e, "Result consumer task failed"),
        }
        metrics.shutdown();

        info!("HART exporter shutdown complete");
        result
    }

    /// Waits for the first of: a shutdown signal, the end of polling, or the
    /// end of the HTTP server. Then stops everything else.
    async fn supervise(
        &self,
        mut poller: JoinHandle<Result<(), PollerError>>,
        stop: Arc<Notify>,
        mut server: Option<JoinHandle<ApiResult<()>>>,
    ) -> BinResult<()> {
        let exit = tokio::select! {
            _ = self.shutdown.wait_for_shutdown() => Exit::Signal,
            joined = &mut poller => Exit::Poller(joined),
            joined = wait_server(&mut server) => Exit::Server(joined),
        };

        let result = match exit {
            Exit::Signal => {
                info!("Shutdown requested, stopping scheduler");
                stop.notify_one();
                poller_result(poller.await)
            }
            Exit::Poller(joined) => match poller_result(joined) {
                Err(BinError::Poller(e))
                    if e.is_identification()
                        && !self.config.poller.exit_on_identification_failure =>
                {
                    warn!(
                        error = %e,
                        "Polling will not start, HTTP endpoint stays up until shutdown"
                    );
                    self.shutdown.wait_for_shutdown().await;
                    Ok(())
                }
                Ok(()) => Ok(()),
                Err(e) => {
                    error!(error = %e, "Polling ended");
                    Err(e)
                }
            },
            Exit::Server(joined) => {
                server = None;
                stop.notify_one();
                if let Err(e) = poller_result(poller.await) {
                    warn!(error = %e, "Scheduler stopped with error");
                }
                match joined {
                    Ok(Ok(())) => Err(BinError::runtime("HTTP server stopped unexpectedly")),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(BinError::runtime(format!("HTTP server task failed: {e}"))),
                }
            }
        };

        self.shutdown.initiate_shutdown();
        if let Some(handle) = server {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "HTTP server stopped with error"),
                Err(e) => warn!(error = %e, "HTTP server task failed"),
            }
        }

        result
    }
}

enum Exit {
    Signal,
    Poller(Result<Result<(), PollerError>, JoinError>),
    Server(Result<ApiResult<()>, JoinError>),
}

async fn wait_server(
    server: &mut Option<JoinHandle<ApiResult<()>>>,
) -> Result<ApiResult<()>, JoinError> {
    match server {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

fn poller_result(joined: Result<Result<(), PollerError>, JoinError>) -> BinResult<()> {
    match joined {
        Ok(result) => result.map_err(BinError::from),
        Err(e) => Err(BinError::runtime(format!("Scheduler task failed: {e}"))),
    }
}

fn create_engine(device: &DeviceConfig) -> Box<dyn ProtocolEngine> {
    match device.engine {
        EngineKind::Simulated => Box::new(SimulatedEngine::new(device.simulator.options())),
    }
}

fn log_consumer_stats(stats: &ConsumerStats) {
    info!(
        received = stats.received,
        published = stats.published,
        unsupported = stats.unsupported,
        discarded = stats.discarded,
        "Result consumer drained"
    );
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`ExporterRuntime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<HartConfig>,
    engine: Option<Box<dyn ProtocolEngine>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration from this file.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly. Takes precedence over a path.
    pub fn config(mut self, config: HartConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the protocol engine.
    pub fn engine(mut self, engine: Box<dyn ProtocolEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<ExporterRuntime> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path).map_err(|e| {
                    BinError::from(e).with_context(format!("Failed to load {}", path.display()))
                })?
            }
        };

        let runtime = ExporterRuntime::new(config);
        Ok(match self.engine {
            Some(engine) => runtime.with_engine(engine),
            None => runtime,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
