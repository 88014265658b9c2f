// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device model.
//!
//! The scheduler owns one [`Device`] and merges every reply into it before
//! the corresponding result is handed off. Each merge bumps `version`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::engine::Response;
use crate::status::DeviceStatus;
use crate::types::{CommandPayload, DeviceIdentity, ProcessVariable};
use crate::units::UnitCode;

/// Range and damping reported by the output information command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputRange {
    /// Unit of the range values.
    pub unit: UnitCode,
    /// Lower range value.
    pub lower: f64,
    /// Upper range value.
    pub upper: f64,
    /// Damping in seconds.
    pub damping_s: f64,
}

/// Latest known state of the field device.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Device {
    /// Identity; set by the identification command.
    pub identity: Option<DeviceIdentity>,
    /// Field device status of the most recent reply.
    pub status: DeviceStatus,
    /// Primary variable.
    pub pv: Option<ProcessVariable>,
    /// Secondary variable.
    pub sv: Option<ProcessVariable>,
    /// Tertiary variable.
    pub tv: Option<ProcessVariable>,
    /// Quaternary variable.
    pub fv: Option<ProcessVariable>,
    /// Loop current in milliamperes.
    pub loop_current_ma: Option<f64>,
    /// Primary variable as percent of range.
    pub percent_of_range: Option<f64>,
    /// Short tag.
    pub tag: Option<String>,
    /// Descriptor.
    pub descriptor: Option<String>,
    /// Configuration date.
    pub date: Option<NaiveDate>,
    /// Output range.
    pub range: Option<OutputRange>,
    /// Incremented on every merge.
    pub version: u64,
    /// Time of the last merge.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the identification command has succeeded.
    pub fn is_identified(&self) -> bool {
        self.identity.is_some()
    }

    /// Merges a successful reply.
    pub fn merge(&mut self, response: &Response, at: DateTime<Utc>) {
        match &response.payload {
            CommandPayload::Identity(identity) => {
                self.identity = Some(*identity);
            }
            CommandPayload::PrimaryVariable(pv) => {
                self.pv = Some(*pv);
            }
            CommandPayload::LoopCurrent {
                current_ma,
                percent_of_range,
            } => {
                self.loop_current_ma = Some(*current_ma);
                self.percent_of_range = Some(*percent_of_range);
            }
            CommandPayload::DynamicVariables {
                loop_current_ma,
                pv,
                sv,
                tv,
                fv,
            } => {
                self.loop_current_ma = Some(*loop_current_ma);
                self.pv = Some(*pv);
                self.sv = Some(*sv);
                self.tv = Some(*tv);
                self.fv = Some(*fv);
            }
            CommandPayload::TagDescriptorDate {
                tag,
                descriptor,
                date,
            } => {
                self.tag = Some(tag.clone());
                self.descriptor = Some(descriptor.clone());
                self.date = Some(*date);
            }
            CommandPayload::OutputInformation {
                range_unit,
                upper_range,
                lower_range,
                damping_s,
            } => {
                self.range = Some(OutputRange {
                    unit: *range_unit,
                    lower: *lower_range,
                    upper: *upper_range,
                    damping_s: *damping_s,
                });
            }
            CommandPayload::Raw { .. } => {}
        }
        self.merge_status(response.device_status, at);
    }

    /// Merges the device status of a failed reply.
    pub fn merge_status(&mut self, status: DeviceStatus, at: DateTime<Utc>) {
        self.status = status;
        self.version += 1;
        self.updated_at = Some(at);
    }
}
