// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Simulated HART transmitter.
//!
//! A temperature transmitter with a fixed identity and slowly drifting
//! process values. Faults can be injected at a configurable rate: either a
//! composite communication error or a busy reply. With a fixed seed the
//! sequence of replies is reproducible.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::command::CommandKind;
use crate::engine::{ProtocolEngine, Response};
use crate::error::{EngineError, EngineResult};
use crate::status::{CommErrorFlags, CommandStatus, DeviceStatus};
use crate::types::{CommandPayload, DeviceIdentity, ProcessVariable};
use crate::units::UnitCode;

const LOWER_RANGE: f64 = 0.0;
const UPPER_RANGE: f64 = 100.0;

/// Simulator settings.
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    /// Identity reported by command 0.
    pub identity: DeviceIdentity,
    /// Tag reported by command 13.
    pub tag: String,
    /// Fail every identification attempt with a timeout.
    pub fail_identification: bool,
    /// Probability (0.0 to 1.0) that a steady-state command fails.
    pub fault_rate: f64,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Artificial reply latency.
    pub latency: Duration,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity {
                manufacturer_id: 0x26,
                device_type: 0x05,
                device_id: 1_234_567,
            },
            tag: "TT-101".to_string(),
            fail_identification: false,
            fault_rate: 0.0,
            seed: None,
            latency: Duration::ZERO,
        }
    }
}

/// In-process stand-in for a field device.
pub struct SimulatedEngine {
    options: SimulatorOptions,
    channel: Option<String>,
    rng: StdRng,
    tick: u64,
    cold_start: bool,
}

impl SimulatedEngine {
    /// Creates a closed simulator.
    pub fn new(options: SimulatorOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            options,
            channel: None,
            rng,
            tick: 0,
            cold_start: true,
        }
    }

    fn device_status(&mut self) -> DeviceStatus {
        if std::mem::take(&mut self.cold_start) {
            DeviceStatus::COLD_START
        } else {
            DeviceStatus::OK
        }
    }

    fn temperature(&self) -> f64 {
        let phase = self.tick as f64 / 20.0;
        23.5 + 1.5 * phase.sin()
    }

    fn inject_fault(&mut self, command: CommandKind) -> Option<EngineError> {
        let rate = self.options.fault_rate.clamp(0.0, 1.0);
        if rate == 0.0 || !self.rng.gen_bool(rate) {
            return None;
        }
        let error = if self.rng.gen_bool(0.5) {
            let mut flags = CommErrorFlags::FRAMING_ERROR;
            if self.rng.gen_bool(0.5) {
                flags |= CommErrorFlags::OVERRUN;
            }
            if self.rng.gen_bool(0.25) {
                flags |= CommErrorFlags::VERTICAL_PARITY_ERROR;
            }
            EngineError::communication(flags | CommErrorFlags::COMMUNICATION_ERROR)
        } else {
            EngineError::rejected(command.number(), CommandStatus::Busy, DeviceStatus::OK)
        };
        Some(error)
    }

    fn reply(&mut self, command: CommandKind) -> CommandPayload {
        let pv = self.temperature();
        let percent = (pv - LOWER_RANGE) / (UPPER_RANGE - LOWER_RANGE) * 100.0;
        let current = 4.0 + 16.0 * percent / 100.0;

        match command {
            CommandKind::ReadUniqueIdentifier => CommandPayload::Identity(self.options.identity),
            CommandKind::ReadPrimaryVariable => {
                CommandPayload::PrimaryVariable(ProcessVariable::new(pv, UnitCode::DEG_C))
            }
            CommandKind::ReadLoopCurrentAndPercentOfRange => CommandPayload::LoopCurrent {
                current_ma: current,
                percent_of_range: percent,
            },
            CommandKind::ReadDynamicVariables => CommandPayload::DynamicVariables {
                loop_current_ma: current,
                pv: ProcessVariable::new(pv, UnitCode::DEG_C),
                sv: ProcessVariable::new(31.0 + 0.1 * (self.tick % 10) as f64, UnitCode::DEG_C),
                tv: ProcessVariable::new(101.3, UnitCode::KPA),
                fv: ProcessVariable::new(24.0, UnitCode::new(58)),
            },
            CommandKind::ReadTagDescriptorDate => CommandPayload::TagDescriptorDate {
                tag: self.options.tag.clone(),
                descriptor: "SIMULATED DEVICE".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default(),
            },
            CommandKind::ReadOutputInformation => CommandPayload::OutputInformation {
                range_unit: UnitCode::DEG_C,
                upper_range: UPPER_RANGE,
                lower_range: LOWER_RANGE,
                damping_s: 0.5,
            },
            CommandKind::Unsupported(_) => CommandPayload::Raw {
                data: vec![0; 4],
            },
        }
    }
}

#[async_trait]
impl ProtocolEngine for SimulatedEngine {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn open(&mut self, channel: &str) -> EngineResult<()> {
        if channel.trim().is_empty() {
            return Err(EngineError::open_failed(channel, "channel name is empty"));
        }
        info!(channel, "Simulated channel opened");
        self.channel = Some(channel.to_string());
        self.cold_start = true;
        Ok(())
    }

    async fn close(&mut self) -> EngineResult<()> {
        if let Some(channel) = self.channel.take() {
            info!(channel = %channel, "Simulated channel closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    async fn execute(&mut self, command: CommandKind) -> EngineResult<Response> {
        if !self.is_open() {
            return Err(EngineError::NotOpen);
        }
        if !self.options.latency.is_zero() {
            tokio::time::sleep(self.options.latency).await;
        }

        if command == CommandKind::ReadUniqueIdentifier {
            if self.options.fail_identification {
                return Err(EngineError::timeout(Duration::from_millis(500)));
            }
        } else if let Some(error) = self.inject_fault(command) {
            debug!(command = command.number(), error = %error, "Injected fault");
            return Err(error);
        }

        self.tick += 1;
        let payload = self.reply(command);
        let device_status = self.device_status();
        Ok(Response::new(payload).with_device_status(device_status))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(fault_rate: f64) -> SimulatedEngine {
        SimulatedEngine::new(SimulatorOptions {
            fault_rate,
            seed: Some(7),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_open_requires_name() {
        let mut engine = seeded(0.0);
        assert!(matches!(engine.open("").await, Err(EngineError::OpenFailed { .. })));
        assert!(matches!(
            engine.execute(CommandKind::ReadPrimaryVariable).await,
            Err(EngineError::NotOpen)
        ));
    }

    #[tokio::test]
    async fn test_identity_and_cold_start() {
        let mut engine = seeded(0.0);
        engine.open("/dev/ttyUSB0").await.unwrap();

        let first = engine.execute(CommandKind::ReadUniqueIdentifier).await.unwrap();
        assert_eq!(first.device_status, DeviceStatus::COLD_START);
        assert!(matches!(first.payload, CommandPayload::Identity(id) if id.device_id == 1_234_567));

        let second = engine.execute(CommandKind::ReadPrimaryVariable).await.unwrap();
        assert!(second.device_status.is_ok());
    }

    #[tokio::test]
    async fn test_fail_identification() {
        let mut engine = SimulatedEngine::new(SimulatorOptions {
            fail_identification: true,
            ..Default::default()
        });
        engine.open("sim").await.unwrap();
        assert!(matches!(
            engine.execute(CommandKind::ReadUniqueIdentifier).await,
            Err(EngineError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_values_in_range() {
        let mut engine = seeded(0.0);
        engine.open("sim").await.unwrap();
        for _ in 0..50 {
            let response = engine
                .execute(CommandKind::ReadLoopCurrentAndPercentOfRange)
                .await
                .unwrap();
            if let CommandPayload::LoopCurrent {
                current_ma,
                percent_of_range,
            } = response.payload
            {
                assert!((4.0..=20.0).contains(&current_ma));
                assert!((0.0..=100.0).contains(&percent_of_range));
            } else {
                panic!("unexpected payload");
            }
        }
    }

    #[tokio::test]
    async fn test_full_fault_rate() {
        let mut engine = seeded(1.0);
        engine.open("sim").await.unwrap();

        // Identification is never faulted.
        assert!(engine.execute(CommandKind::ReadUniqueIdentifier).await.is_ok());
        for _ in 0..20 {
            let err = engine.execute(CommandKind::ReadPrimaryVariable).await.unwrap_err();
            match err {
                EngineError::Communication { flags } => {
                    assert!(flags.contains(CommErrorFlags::FRAMING_ERROR));
                    assert!(flags.contains(CommErrorFlags::COMMUNICATION_ERROR));
                }
                EngineError::CommandRejected { status, .. } => {
                    assert_eq!(status, CommandStatus::Busy);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut engine = seeded(0.0);
        engine.open("sim").await.unwrap();
        engine.close().await.unwrap();
        engine.close().await.unwrap();
        assert!(!engine.is_open());
    }
}
