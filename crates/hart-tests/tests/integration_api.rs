// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Integration Tests
//!
//! The HTTP endpoint reading the registry and shared state that a real
//! pipeline run produced.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use hart_api::{ApiError, ApiServer, ServerConfig};
use hart_core::{EngineError, HartMetrics, MetricsOptions, PollerState, SnapshotShape};

use hart_tests::common::{MockEngine, Pipeline};

fn router(pipeline: &Pipeline, shape: SnapshotShape) -> Router {
    ApiServer::builder()
        .config(ServerConfig::default().with_snapshot(shape))
        .poller(pipeline.state.clone())
        .metrics(pipeline.metrics.clone())
        .build()
        .unwrap()
        .router()
}

async fn polled() -> Pipeline {
    let pipeline = Pipeline::new(MockEngine::transmitter());
    let outcome = pipeline.run_for(Duration::from_secs(1)).await;
    assert!(outcome.result.is_ok());
    pipeline
}

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(router, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// =============================================================================
// /metrics
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_metrics_exposition() {
    let pipeline = polled().await;
    let (status, content_type, body) = get(router(&pipeline, SnapshotShape::Full), "/metrics").await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
    assert!(text.contains("device_pv_value{unit=\"degC\"} 23.5"));
    assert!(text.contains("device_current_value 7.76"));
    assert!(text.contains("ManufacturerId=\"34\""));
    assert!(text.contains("DeviceId=\"1234567\""));
    assert!(text.contains("command_status_total{status=\"success\"} 6"));
    assert!(text.contains("app_info{version="));
}

#[tokio::test]
async fn test_metrics_namespace_prefix() {
    let metrics =
        Arc::new(HartMetrics::new(MetricsOptions::default().with_namespace("plant_a")).unwrap());
    let router = ApiServer::builder()
        .poller(PollerState::new())
        .metrics(metrics)
        .build()
        .unwrap()
        .router();

    let (_, _, body) = get(router, "/metrics").await;
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("plant_a_app_info"));
    assert!(!text.lines().any(|line| line.starts_with("app_info")));
}

// =============================================================================
// /hart
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_snapshot_full_shape() {
    let pipeline = polled().await;
    let (status, body) = get_json(router(&pipeline, SnapshotShape::Full), "/hart").await;

    assert_eq!(status, StatusCode::OK);
    let parts = body.as_array().expect("full snapshot is an array");
    assert_eq!(parts.len(), 2);

    let device = &parts[0];
    assert_eq!(device["tag"], "TT-4711");
    assert_eq!(device["pv"]["value"], 23.5);
    assert_eq!(device["pv"]["unit"], "degC");
    assert_eq!(device["identity"]["device_id"], 1_234_567);

    let commands = parts[1].as_array().expect("command list");
    let numbers: Vec<u64> = commands
        .iter()
        .map(|c| c["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![0, 1, 2, 3, 13, 15]);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_device_shape() {
    let pipeline = polled().await;
    let (status, body) = get_json(router(&pipeline, SnapshotShape::Device), "/hart").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
    assert_eq!(body["loop_current_ma"], 7.76);
    assert_eq!(body["descriptor"], "REACTOR INLET");
}

#[tokio::test(start_paused = true)]
async fn test_command_endpoint() {
    let pipeline = polled().await;

    let (status, body) = get_json(router(&pipeline, SnapshotShape::Full), "/hart/commands/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], 1);
    assert_eq!(body["successes"], 1);
    assert_eq!(body["failures"], 0);

    let (status, body) =
        get_json(router(&pipeline, SnapshotShape::Full), "/hart/commands/48").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// /health
// =============================================================================

#[tokio::test]
async fn test_health_before_polling() {
    let pipeline = Pipeline::new(MockEngine::transmitter());
    let (status, body) = get_json(router(&pipeline, SnapshotShape::Full), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["phase"], "starting");
    assert!(body["device"].is_null());
}

#[tokio::test(start_paused = true)]
async fn test_health_after_stop() {
    let pipeline = polled().await;
    let (status, body) = get_json(router(&pipeline, SnapshotShape::Full), "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["phase"], "stopped");
    assert_eq!(body["device"], "34/21/1234567");
    assert_eq!(body["stats"]["commands_ok"], 6);
}

#[tokio::test(start_paused = true)]
async fn test_health_after_identification_failure() {
    let engine = MockEngine::transmitter();
    engine.then_fail(0, EngineError::timeout(Duration::from_millis(500)));
    let pipeline = Pipeline::new(engine);
    pipeline.run_to_end().await;

    let (status, body) = get_json(router(&pipeline, SnapshotShape::Full), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["phase"], "identification_failed");
    assert_eq!(body["stats"]["commands_failed"], 1);
}

// =============================================================================
// Server
// =============================================================================

#[tokio::test]
async fn test_server_serves_and_shuts_down() {
    let pipeline = Pipeline::new(MockEngine::transmitter());
    let server = ApiServer::builder()
        .config(ServerConfig::new("127.0.0.1:0".parse().unwrap()))
        .poller(pipeline.state.clone())
        .metrics(pipeline.metrics.clone())
        .build()
        .unwrap();

    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8_lossy(&response);
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("\"phase\":\"starting\""));

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_run_with_shutdown_binds_and_stops() {
    let pipeline = Pipeline::new(MockEngine::transmitter());
    let server = ApiServer::builder()
        .config(ServerConfig::new("127.0.0.1:0".parse().unwrap()))
        .poller(pipeline.state.clone())
        .metrics(pipeline.metrics.clone())
        .build()
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server.run_with_shutdown(async {}))
        .await
        .expect("server should stop");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_run_with_shutdown_reports_bind_failure() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let pipeline = Pipeline::new(MockEngine::transmitter());
    let server = ApiServer::builder()
        .config(ServerConfig::new(addr))
        .poller(pipeline.state.clone())
        .metrics(pipeline.metrics.clone())
        .build()
        .unwrap();

    let err = server.run_with_shutdown(async {}).await.unwrap_err();
    assert!(matches!(err, ApiError::Bind { addr: a, .. } if a == addr));
}
