// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! A temperature transmitter with identity `34/21/1234567`, a PV of
//! 23.5 degC and a 0..100 degC range.

use chrono::NaiveDate;
use hart_core::{CommandPayload, DeviceIdentity, ProcessVariable, Response, UnitCode};

// =============================================================================
// Device Fixtures
// =============================================================================

/// Device identities.
pub struct DeviceFixtures;

impl DeviceFixtures {
    /// The reference transmitter.
    pub fn identity() -> DeviceIdentity {
        DeviceIdentity {
            manufacturer_id: 0x34,
            device_type: 0x21,
            device_id: 1_234_567,
        }
    }

    /// Identity labels as they appear on `device_info`.
    pub fn identity_labels() -> [(&'static str, &'static str); 3] {
        [
            ("ManufacturerId", "34"),
            ("DeviceType", "21"),
            ("DeviceId", "1234567"),
        ]
    }

    /// Tag reported by command 13.
    pub const TAG: &'static str = "TT-4711";

    /// Descriptor reported by command 13.
    pub const DESCRIPTOR: &'static str = "REACTOR INLET";

    /// Configuration date reported by command 13.
    pub fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
    }
}

// =============================================================================
// Response Fixtures
// =============================================================================

/// Decoded replies for each supported command.
pub struct ResponseFixtures;

impl ResponseFixtures {
    /// Command 0.
    pub fn identity() -> Response {
        Response::new(CommandPayload::Identity(DeviceFixtures::identity()))
    }

    /// Command 1 in degC.
    pub fn primary_variable(value: f64) -> Response {
        Self::primary_variable_in(value, UnitCode::DEG_C)
    }

    /// Command 1 in an arbitrary unit.
    pub fn primary_variable_in(value: f64, unit: UnitCode) -> Response {
        Response::new(CommandPayload::PrimaryVariable(ProcessVariable::new(value, unit)))
    }

    /// Command 2.
    pub fn loop_current(current_ma: f64, percent_of_range: f64) -> Response {
        Response::new(CommandPayload::LoopCurrent {
            current_ma,
            percent_of_range,
        })
    }

    /// Command 3.
    pub fn dynamic_variables() -> Response {
        Response::new(CommandPayload::DynamicVariables {
            loop_current_ma: 7.76,
            pv: ProcessVariable::new(23.5, UnitCode::DEG_C),
            sv: ProcessVariable::new(31.2, UnitCode::DEG_C),
            tv: ProcessVariable::new(101.3, UnitCode::KPA),
            fv: ProcessVariable::new(24.0, UnitCode::new(58)),
        })
    }

    /// Command 13.
    pub fn tag_descriptor_date() -> Response {
        Response::new(CommandPayload::TagDescriptorDate {
            tag: DeviceFixtures::TAG.to_string(),
            descriptor: DeviceFixtures::DESCRIPTOR.to_string(),
            date: DeviceFixtures::date(),
        })
    }

    /// Command 15.
    pub fn output_information() -> Response {
        Response::new(CommandPayload::OutputInformation {
            range_unit: UnitCode::DEG_C,
            upper_range: 100.0,
            lower_range: 0.0,
            damping_s: 0.5,
        })
    }

    /// Reply of a command without a decoder.
    pub fn raw(data: Vec<u8>) -> Response {
        Response::new(CommandPayload::Raw { data })
    }

    /// Default reply for a command number, if the transmitter supports it.
    pub fn for_command(number: u8) -> Option<Response> {
        match number {
            0 => Some(Self::identity()),
            1 => Some(Self::primary_variable(23.5)),
            2 => Some(Self::loop_current(7.76, 23.5)),
            3 => Some(Self::dynamic_variables()),
            13 => Some(Self::tag_descriptor_date()),
            15 => Some(Self::output_information()),
            _ => None,
        }
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// The same configuration in every supported format.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// YAML document.
    pub fn yaml() -> &'static str {
        r#"
device:
  port: /dev/ttyUSB3
  simulator:
    tag: PT-200
    seed: 42
poller:
  cadence: fixed_delay
  interval_ms: 500
  failure_policy: fail_fast
  commands: [1, 2, 3]
api:
  bind_address: 127.0.0.1
  port: 9100
  snapshot: device
metrics:
  namespace: plant_a
"#
    }

    /// TOML document.
    pub fn toml() -> &'static str {
        r#"
[device]
port = "/dev/ttyUSB3"

[device.simulator]
tag = "PT-200"
seed = 42

[poller]
cadence = "fixed_delay"
interval_ms = 500
failure_policy = "fail_fast"
commands = [1, 2, 3]

[api]
bind_address = "127.0.0.1"
port = 9100
snapshot = "device"

[metrics]
namespace = "plant_a"
"#
    }

    /// JSON document.
    pub fn json() -> &'static str {
        r#"{
  "device": { "port": "/dev/ttyUSB3", "simulator": { "tag": "PT-200", "seed": 42 } },
  "poller": {
    "cadence": "fixed_delay",
    "interval_ms": 500,
    "failure_policy": "fail_fast",
    "commands": [1, 2, 3]
  },
  "api": { "bind_address": "127.0.0.1", "port": 9100, "snapshot": "device" },
  "metrics": { "namespace": "plant_a" }
}"#
    }
}
