// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: poller liveness
//! - [`metrics`]: Prometheus text exposition
//! - [`snapshot`]: device and command records as JSON

mod health;
mod metrics;
mod snapshot;

pub use health::*;
pub use metrics::*;
pub use snapshot::*;
