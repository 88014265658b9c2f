// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use hart_core::{HartMetrics, PollerState};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Handlers only read from it: the poller state is written by the scheduler
/// and the registry by the result consumer.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Poller snapshot.
    pub poller: PollerState,
    /// Prometheus registry.
    pub metrics: Arc<HartMetrics>,
    started_at: Instant,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the seconds since the state was built.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ServerConfig>,
    poller: Option<PollerState>,
    metrics: Option<Arc<HartMetrics>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the poller state.
    pub fn poller(mut self, poller: PollerState) -> Self {
        self.poller = Some(poller);
        self
    }

    /// Sets the metrics registry.
    pub fn metrics(mut self, metrics: Arc<HartMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builds the state. The metrics registry is required.
    pub fn build(self) -> ApiResult<AppState> {
        let metrics = self
            .metrics
            .ok_or_else(|| ApiError::internal("metrics registry is required"))?;

        Ok(AppState {
            config: Arc::new(self.config.unwrap_or_default()),
            poller: self.poller.unwrap_or_default(),
            metrics,
            started_at: Instant::now(),
        })
    }
}
