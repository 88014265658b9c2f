// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hart-bin
//!
//! The `hart-exporter` binary: CLI, logging setup, runtime supervision and
//! graceful shutdown around the hart-core pipeline.
//!
//! ## Architecture
//!
//! ```text
//!                      main.rs
//!                         │
//!                  ┌──────▼──────┐
//!                  │   cli.rs    │
//!                  └──────┬──────┘
//!            ┌────────────┼────────────┐
//!            ▼            ▼            ▼
//!      ┌──────────┐ ┌──────────┐ ┌──────────┐
//!      │ commands │ │ runtime  │ │ logging  │
//!      └──────────┘ └────┬─────┘ └──────────┘
//!                        │
//!                 ┌──────▼──────┐
//!                 │  shutdown   │
//!                 └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Poll the device and serve /metrics (default command)
//! hart-exporter
//!
//! # Custom config, serial port and listen address
//! hart-exporter -c /etc/hart/hart.yaml run --serial /dev/ttyUSB1 --listen 127.0.0.1:9100
//!
//! # Validate configuration
//! hart-exporter validate --show-config
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{ExporterRuntime, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownGuard, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
