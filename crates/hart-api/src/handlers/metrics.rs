// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Prometheus exposition handler.

use axum::{extract::State, http::header, response::IntoResponse};
use hart_core::metrics::TEXT_CONTENT_TYPE;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.encode_text()?;
    Ok(([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body))
}
