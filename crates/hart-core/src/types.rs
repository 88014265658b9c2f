// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Decoded command data.
//!
//! [`CommandPayload`] is a closed tagged union with one variant per supported
//! command. Consumers match on it exhaustively; adding a command means adding
//! a variant here and a publishing arm in the telemetry publisher.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::units::UnitCode;

// =============================================================================
// Process Variables
// =============================================================================

/// A measured value with its engineering unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessVariable {
    /// The measured value.
    pub value: f64,
    /// The engineering unit.
    pub unit: UnitCode,
}

impl ProcessVariable {
    /// Creates a process variable.
    #[inline]
    pub fn new(value: f64, unit: impl Into<UnitCode>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

impl fmt::Display for ProcessVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

// =============================================================================
// Device Identity
// =============================================================================

/// Identity returned by the unique identifier command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentity {
    /// Manufacturer identification code.
    pub manufacturer_id: u8,
    /// Manufacturer device type code.
    pub device_type: u16,
    /// Device identification number (24 bit).
    pub device_id: u32,
}

impl DeviceIdentity {
    /// Manufacturer id label (lowercase hex).
    pub fn manufacturer_label(&self) -> String {
        format!("{:x}", self.manufacturer_id)
    }

    /// Device type label (lowercase hex).
    pub fn device_type_label(&self) -> String {
        format!("{:x}", self.device_type)
    }

    /// Device id label (zero padded to seven digits).
    pub fn device_id_label(&self) -> String {
        format!("{:07}", self.device_id)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.manufacturer_label(),
            self.device_type_label(),
            self.device_id_label()
        )
    }
}

// =============================================================================
// CommandPayload
// =============================================================================

/// Decoded data of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandPayload {
    /// Command 0.
    Identity(DeviceIdentity),

    /// Command 1.
    PrimaryVariable(ProcessVariable),

    /// Command 2.
    LoopCurrent {
        /// Loop current in milliamperes.
        current_ma: f64,
        /// Primary variable as percent of range.
        percent_of_range: f64,
    },

    /// Command 3.
    DynamicVariables {
        /// Loop current in milliamperes.
        loop_current_ma: f64,
        /// Primary variable.
        pv: ProcessVariable,
        /// Secondary variable.
        sv: ProcessVariable,
        /// Tertiary variable.
        tv: ProcessVariable,
        /// Quaternary variable.
        fv: ProcessVariable,
    },

    /// Command 13.
    TagDescriptorDate {
        /// Short tag.
        tag: String,
        /// Descriptor.
        descriptor: String,
        /// Configuration date.
        date: NaiveDate,
    },

    /// Command 15.
    OutputInformation {
        /// Unit of the range values.
        range_unit: UnitCode,
        /// Upper range value.
        upper_range: f64,
        /// Lower range value.
        lower_range: f64,
        /// Damping in seconds.
        damping_s: f64,
    },

    /// Undecoded reply of a command without a typed decoder.
    Raw {
        /// Reply data bytes.
        data: Vec<u8>,
    },
}

impl CommandPayload {
    /// Returns the payload name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            CommandPayload::Identity(_) => "identity",
            CommandPayload::PrimaryVariable(_) => "primary_variable",
            CommandPayload::LoopCurrent { .. } => "loop_current",
            CommandPayload::DynamicVariables { .. } => "dynamic_variables",
            CommandPayload::TagDescriptorDate { .. } => "tag_descriptor_date",
            CommandPayload::OutputInformation { .. } => "output_information",
            CommandPayload::Raw { .. } => "raw",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
