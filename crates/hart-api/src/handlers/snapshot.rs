// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device snapshot handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use hart_core::{Command, SnapshotShape};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /hart
///
/// The device object, or `[device, [commands...]]` with the full shape.
pub async fn hart_snapshot(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let device = to_value(state.poller.device())?;

    let body = match state.config.snapshot {
        SnapshotShape::Device => device,
        SnapshotShape::Full => Value::Array(vec![device, to_value(state.poller.commands())?]),
    };
    Ok(Json(body))
}

/// GET /hart/commands/{number}
pub async fn hart_command(
    State(state): State<AppState>,
    Path(number): Path<u8>,
) -> ApiResult<Json<Command>> {
    state
        .poller
        .command(number)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("command {}", number)))
}

fn to_value(value: impl Serialize) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}
