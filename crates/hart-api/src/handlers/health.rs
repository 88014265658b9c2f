// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health
///
/// 200 while the poller is starting or polling, 503 once it has stopped or
/// failed to identify the device. The body is the same in both cases.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse::from_state(&state.poller, state.uptime_seconds());
    let status = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
