// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Core Integration Tests
//!
//! Scheduler, result channel, consumer and registry wired together against
//! a scripted engine. Every test runs on a paused clock.
//!
//! ## Test Categories
//!
//! - `test_pipeline_*`: values reaching the registry and shared state
//! - `test_failure_*`: classifier counts and failure policies
//! - `test_cadence_*`: sleep timing

use std::time::Duration;

use hart_core::{
    CadencePolicy, CommErrorFlag, CommErrorFlags, CommandStatus, DeviceStatus, EngineError,
    ErrorClassifier, FailurePolicy, PollerError, PollerPhase, UnitCode,
};

use hart_tests::common::{
    init_test_logging, DeviceFixtures, MockEngine, Pipeline, RecordingFailures, ResponseFixtures,
};

// =============================================================================
// Pipeline Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_pipeline_publishes_every_command_family() {
    init_test_logging();
    let pipeline = Pipeline::new(MockEngine::transmitter());

    let outcome = pipeline.run_for(Duration::from_secs(1)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.consumer.received, 6);
    assert_eq!(outcome.consumer.published, 6);

    let m = &pipeline.metrics;
    assert_eq!(m.value("device_info", &DeviceFixtures::identity_labels()), Some(1.0));
    assert_eq!(m.value("device_pv_value", &[("unit", "degC")]), Some(23.5));
    assert_eq!(m.value("device_current_value", &[]), Some(7.76));
    assert_eq!(m.value("device_percent_of_range_value", &[]), Some(23.5));
    assert_eq!(m.value("device_sv_value", &[("unit", "degC")]), Some(31.2));
    let kpa = UnitCode::KPA.to_string();
    assert_eq!(m.value("device_tv_value", &[("unit", kpa.as_str())]), Some(101.3));
    assert_eq!(
        m.value(
            "device_info_cmd13",
            &[
                ("Tag", DeviceFixtures::TAG),
                ("Descriptor", DeviceFixtures::DESCRIPTOR),
                ("Date", "2024-03-01"),
            ]
        ),
        Some(1.0)
    );
    assert_eq!(m.value("device_lower_range_value", &[("unit", "degC")]), Some(0.0));
    assert_eq!(m.value("device_upper_range_value", &[("unit", "degC")]), Some(100.0));
    assert_eq!(m.value("device_damping_value", &[]), Some(0.5));
    assert_eq!(m.value("command_status_total", &[("status", "success")]), Some(6.0));
    assert_eq!(m.value("device_status_total", &[("status", "ok")]), Some(6.0));

    let device = pipeline.state.device();
    assert_eq!(device.identity, Some(DeviceFixtures::identity()));
    assert_eq!(device.tag.as_deref(), Some(DeviceFixtures::TAG));
    assert_eq!(pipeline.state.phase(), PollerPhase::Stopped);

    let stats = pipeline.state.stats();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.commands_ok, 6);
    assert_eq!(stats.commands_failed, 0);
    assert_eq!(pipeline.engine.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_pv_update_overwrites_gauge() {
    let engine = MockEngine::transmitter();
    engine.then_reply(1, ResponseFixtures::primary_variable(23.5));
    engine.reply(1, ResponseFixtures::primary_variable(24.1));
    let pipeline = Pipeline::new(engine).with_commands(&[1]);

    let outcome = pipeline.run_for(Duration::from_secs(3)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(pipeline.engine.count(1), 2);

    assert_eq!(
        pipeline.metrics.value("device_pv_value", &[("unit", "degC")]),
        Some(24.1)
    );
    assert_eq!(pipeline.state.device().pv.map(|pv| pv.value), Some(24.1));
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_unit_change_drops_previous_series() {
    let engine = MockEngine::transmitter();
    engine.then_reply(1, ResponseFixtures::primary_variable(23.5));
    engine.reply(1, ResponseFixtures::primary_variable_in(10.0, UnitCode::KPA));
    let pipeline = Pipeline::new(engine).with_commands(&[1]);

    pipeline.run_for(Duration::from_secs(3)).await;

    let kpa = UnitCode::KPA.to_string();
    let m = &pipeline.metrics;
    assert_eq!(m.value("device_pv_value", &[("unit", "degC")]), None);
    assert_eq!(m.value("device_pv_value", &[("unit", kpa.as_str())]), Some(10.0));
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_republish_moves_only_status_counters() {
    let pipeline = Pipeline::new(MockEngine::transmitter());

    pipeline.run_for(Duration::from_secs(3)).await;

    let m = &pipeline.metrics;
    assert_eq!(pipeline.state.stats().cycles, 2);
    assert_eq!(m.value("command_status_total", &[("status", "success")]), Some(11.0));
    assert_eq!(m.value("device_pv_value", &[("unit", "degC")]), Some(23.5));
    assert_eq!(m.value("device_current_value", &[]), Some(7.76));
    assert_eq!(m.value("device_info", &DeviceFixtures::identity_labels()), Some(1.0));
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_unsupported_command_counts_status_only() {
    let engine = MockEngine::transmitter();
    engine.reply(48, ResponseFixtures::raw(vec![0x00, 0x10]));
    let pipeline = Pipeline::new(engine).with_commands(&[1, 48]);

    let outcome = pipeline.run_for(Duration::from_secs(1)).await;
    assert_eq!(outcome.consumer.received, 3);
    assert_eq!(outcome.consumer.published, 2);
    assert_eq!(outcome.consumer.unsupported, 1);
    assert_eq!(
        pipeline.metrics.value("command_status_total", &[("status", "success")]),
        Some(3.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_device_status_labels() {
    let engine = MockEngine::transmitter();
    engine.then_reply(
        0,
        ResponseFixtures::identity().with_device_status(DeviceStatus::COLD_START),
    );
    engine.then_reply(
        1,
        ResponseFixtures::primary_variable(23.5).with_status(CommandStatus::UpdateFailure),
    );
    let pipeline = Pipeline::new(engine).with_commands(&[1]);

    pipeline.run_for(Duration::from_secs(1)).await;

    let m = &pipeline.metrics;
    assert_eq!(m.value("device_status_total", &[("status", "cold_start")]), Some(1.0));
    assert_eq!(m.value("device_status_total", &[("status", "ok")]), Some(1.0));
    assert_eq!(
        m.value("command_status_total", &[("status", "update_failure")]),
        Some(1.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_after_registry_shutdown_discards() {
    let pipeline = Pipeline::new(MockEngine::transmitter());
    pipeline.metrics.shutdown();

    let outcome = pipeline.run_for(Duration::from_secs(1)).await;
    assert_eq!(outcome.consumer.received, 6);
    assert_eq!(outcome.consumer.discarded, 6);
    assert_eq!(pipeline.metrics.value("device_pv_value", &[("unit", "degC")]), None);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failure_identification_closes_channel_without_sends() {
    let engine = MockEngine::transmitter();
    engine.then_fail(0, EngineError::timeout(Duration::from_millis(500)));
    let pipeline = Pipeline::new(engine);

    let outcome = pipeline.run_to_end().await;
    assert!(matches!(outcome.result, Err(PollerError::Identification { .. })));
    assert_eq!(outcome.consumer.received, 0);
    assert_eq!(pipeline.engine.calls(), vec![0]);
    assert_eq!(pipeline.engine.close_count(), 1);
    assert_eq!(pipeline.state.phase(), PollerPhase::IdentificationFailed);

    let description = EngineError::timeout(Duration::from_millis(500)).to_string();
    let m = &pipeline.metrics;
    assert_eq!(
        m.value("command_errors_total", &[("error", description.as_str())]),
        Some(1.0)
    );
    assert_eq!(m.value("device_info", &DeviceFixtures::identity_labels()), None);
}

#[tokio::test(start_paused = true)]
async fn test_failure_composite_counts_each_flag() {
    let engine = MockEngine::transmitter();
    engine.then_fail(
        1,
        EngineError::communication(CommErrorFlags::FRAMING_ERROR | CommErrorFlags::OVERRUN),
    );
    let pipeline = Pipeline::new(engine).with_commands(&[1, 2]);

    let outcome = pipeline.run_for(Duration::from_secs(1)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(outcome.consumer.received, 2);

    let m = &pipeline.metrics;
    let flag = |name: &str| m.value("communication_errors_total", &[("flag", name)]);
    assert_eq!(flag("framing_error"), Some(1.0));
    assert_eq!(flag("overrun"), Some(1.0));
    assert_eq!(flag("communication_error"), None);
    assert_eq!(flag("vertical_parity_error"), None);
    assert_eq!(m.value("command_errors_total", &[]), None);

    let stats = pipeline.state.stats();
    assert_eq!(stats.commands_ok, 2);
    assert_eq!(stats.commands_failed, 1);
    let record = pipeline.state.command(1).expect("command 1 is tracked");
    assert_eq!(record.failures(), 1);
    assert!(record.last_error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_failure_plain_error_counted_by_description() {
    let engine = MockEngine::transmitter();
    engine.then_fail(2, EngineError::rejected(2, CommandStatus::Busy, DeviceStatus::OK));
    let pipeline = Pipeline::new(engine).with_commands(&[1, 2]);

    let outcome = pipeline.run_for(Duration::from_secs(3)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(pipeline.engine.count(2), 2);

    let description = EngineError::rejected(2, CommandStatus::Busy, DeviceStatus::OK).to_string();
    assert_eq!(
        pipeline
            .metrics
            .value("command_errors_total", &[("error", description.as_str())]),
        Some(1.0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_fail_fast_stops_polling() {
    let engine = MockEngine::transmitter();
    engine.then_fail(2, EngineError::timeout(Duration::from_millis(500)));
    let pipeline = Pipeline::new(engine)
        .with_commands(&[1, 2, 3])
        .with_failure_policy(FailurePolicy::FailFast);

    let outcome = pipeline.run_to_end().await;
    assert!(matches!(
        outcome.result,
        Err(PollerError::CommandFailed { command: 2, .. })
    ));
    assert_eq!(pipeline.engine.calls(), vec![0, 1, 2]);
    assert_eq!(outcome.consumer.received, 2);
    assert_eq!(pipeline.state.phase(), PollerPhase::Stopped);
}

#[test]
fn test_failure_classifier_decomposes_flags() {
    let recorder = RecordingFailures::new();
    let error =
        EngineError::communication(CommErrorFlags::FRAMING_ERROR | CommErrorFlags::OVERRUN);

    assert_eq!(ErrorClassifier::record(&error, &recorder), 2);
    let flags = recorder.flags();
    assert_eq!(flags.len(), 2);
    assert!(flags.contains(&CommErrorFlag::FramingError));
    assert!(flags.contains(&CommErrorFlag::Overrun));
    assert!(recorder.errors().is_empty());

    let plain = EngineError::transport("port vanished");
    assert_eq!(ErrorClassifier::record(&plain, &recorder), 1);
    assert_eq!(recorder.errors(), vec![plain.to_string()]);
}

// =============================================================================
// Cadence Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cadence_cycle_budget() {
    let pipeline = Pipeline::new(MockEngine::transmitter())
        .with_commands(&[1])
        .with_cadence(CadencePolicy::CycleBudget(Duration::from_secs(2)));

    pipeline.run_for(Duration::from_millis(4500)).await;

    let times: Vec<_> = pipeline
        .engine
        .call_times()
        .into_iter()
        .filter(|(n, _)| *n == 1)
        .map(|(_, at)| at)
        .collect();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_secs(2));
    assert_eq!(times[2] - times[1], Duration::from_secs(2));
    assert_eq!(pipeline.state.stats().cycles, 3);
}

#[tokio::test(start_paused = true)]
async fn test_cadence_cycle_budget_overrun_starts_next_cycle_at_once() {
    let engine = MockEngine::transmitter();
    engine.with_latency(1, Duration::from_millis(1500));
    engine.with_latency(2, Duration::from_millis(1500));
    let pipeline = Pipeline::new(engine)
        .with_commands(&[1, 2])
        .with_cadence(CadencePolicy::CycleBudget(Duration::from_secs(2)));

    let outcome = pipeline.run_for(Duration::from_secs(5)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(pipeline.engine.calls(), vec![0, 1, 2, 1, 2]);

    let times: Vec<_> = pipeline
        .engine
        .call_times()
        .into_iter()
        .skip(1)
        .map(|(_, at)| at)
        .collect();
    // The cycle took 3 s against a 2 s budget: no sleep before the next one.
    assert_eq!(times[2] - times[1], Duration::from_millis(1500));
    assert_eq!(times[2] - times[0], Duration::from_secs(3));
    assert_eq!(pipeline.state.stats().cycles, 2);
}

#[tokio::test(start_paused = true)]
async fn test_cadence_fixed_delay() {
    let pipeline = Pipeline::new(MockEngine::transmitter())
        .with_commands(&[1, 2])
        .with_cadence(CadencePolicy::FixedDelay(Duration::from_millis(100)));

    let outcome = pipeline.run_for(Duration::from_millis(350)).await;
    assert!(outcome.result.is_ok());
    assert_eq!(pipeline.engine.calls(), vec![0, 1, 2, 1, 2]);

    let times: Vec<_> = pipeline
        .engine
        .call_times()
        .into_iter()
        .skip(1)
        .map(|(_, at)| at)
        .collect();
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(100));
    }
}

#[tokio::test(start_paused = true)]
async fn test_cadence_larger_channel_keeps_order() {
    let engine = MockEngine::transmitter();
    engine.then_reply(1, ResponseFixtures::primary_variable(20.0));
    engine.then_reply(1, ResponseFixtures::primary_variable(21.0));
    engine.reply(1, ResponseFixtures::primary_variable(22.0));
    let pipeline = Pipeline::new(engine)
        .with_commands(&[1])
        .with_capacity(8)
        .with_cadence(CadencePolicy::FixedDelay(Duration::from_millis(10)));

    let outcome = pipeline.run_for(Duration::from_millis(25)).await;
    assert_eq!(outcome.consumer.received, 4);
    assert_eq!(
        pipeline.metrics.value("device_pv_value", &[("unit", "degC")]),
        Some(22.0)
    );
}
