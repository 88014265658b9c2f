// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # HART Integration Tests
//!
//! Shared fixtures, a scripted protocol engine and a pipeline harness for
//! the integration suites under `tests/`.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hart-tests
//! cargo test -p hart-tests --test integration_core
//! cargo test -p hart-tests --test integration_config
//! cargo test -p hart-tests --test integration_api
//! ```
//!
//! ## Test Categories
//!
//! ### Core Tests (`integration_core.rs`)
//! - Scheduler, consumer and publisher wired end to end
//! - Identification failure and failure policies
//! - Cadence timing on a paused clock
//!
//! ### Config Tests (`integration_config.rs`)
//! - YAML, TOML and JSON files on disk
//! - Placeholders and environment overrides
//!
//! ### API Tests (`integration_api.rs`)
//! - `/metrics`, `/hart`, `/health` against a populated pipeline
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use hart_tests::common::{MockEngine, Pipeline};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_something() {
//!     let pipeline = Pipeline::new(MockEngine::transmitter());
//!     let outcome = pipeline.run_for(Duration::from_secs(3)).await;
//!     assert!(outcome.result.is_ok());
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
}
