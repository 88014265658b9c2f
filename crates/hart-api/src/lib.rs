// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hart-api
//!
//! HTTP exposition endpoint for the HART exporter.
//!
//! | Route                     | Body                                         |
//! |---------------------------|----------------------------------------------|
//! | `GET /metrics`            | Prometheus text format                       |
//! | `GET /hart`               | device JSON, or `[device, [commands...]]`    |
//! | `GET /hart/commands/{n}`  | one command record                           |
//! | `GET /health`             | poller phase and stats; 503 once stopped     |
//!
//! Handlers only read the shared [`hart_core::PollerState`] and the
//! [`hart_core::HartMetrics`] registry.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use hart_core::SnapshotShape;
pub use response::HealthResponse;
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
