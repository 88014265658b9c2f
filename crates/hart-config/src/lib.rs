// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hart-config
//!
//! Configuration management for the HART exporter.
//!
//! ## Features
//!
//! - **Schema Definition**: device, poller, api and metrics sections with validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `HART_*` variables and `${VAR:default}` placeholders
//!
//! ## Quick Start
//!
//! ```no_run
//! use hart_config::loader::load_config;
//!
//! let config = load_config("hart.yaml").unwrap();
//! println!("Port: {}", config.device.port);
//! println!("Commands: {:?}", config.poller.commands);
//! ```
//!
//! ## Example file
//!
//! ```yaml
//! device:
//!   port: "${HART_PORT:/dev/ttyUSB0}"
//!   engine: simulated
//! poller:
//!   cadence: cycle_budget
//!   interval_ms: 2000
//!   failure_policy: fail_soft
//!   commands: [1, 2, 3, 13, 15]
//! api:
//!   port: 3333
//!   snapshot: full
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    default_config_path, load_config, load_config_str, ConfigFormat, ConfigLoader,
    DEFAULT_ENV_PREFIX,
};
pub use schema::{
    ApiConfig, CadenceKind, DeviceConfig, EngineKind, HartConfig, MetricsConfig, PollerConfig,
    SimulatorConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
