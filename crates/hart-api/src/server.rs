// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use hart_core::{HartMetrics, PollerState};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP exposition server.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Creates a builder.
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::new()
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::prometheus_metrics))
            .route("/hart", get(handlers::hart_snapshot))
            .route("/hart/commands/{number}", get(handlers::hart_command))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Returns the configured address.
    pub fn addr(&self) -> SocketAddr {
        self.state.config.socket_addr()
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> ApiResult<TcpListener> {
        let addr = self.addr();
        TcpListener::bind(addr)
            .await
            .map_err(|source| ApiError::Bind { addr, source })
    }

    /// Binds and runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = listener.local_addr().unwrap_or_else(|_| self.addr());
        info!("Starting API server on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");
        Ok(())
    }
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
#[derive(Default)]
pub struct ApiServerBuilder {
    state_builder: crate::state::AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the poller state.
    pub fn poller(mut self, poller: PollerState) -> Self {
        self.state_builder = self.state_builder.poller(poller);
        self
    }

    /// Sets the metrics registry.
    pub fn metrics(mut self, metrics: Arc<HartMetrics>) -> Self {
        self.state_builder = self.state_builder.metrics(metrics);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

// =============================================================================
// Tests
// =============================================================================
