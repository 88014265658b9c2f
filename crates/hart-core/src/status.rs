// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Status bytes carried by every HART reply.
//!
//! A reply carries two status bytes. When the top bit of the first byte is
//! set, the byte is a set of communication fault flags ([`CommErrorFlags`]);
//! otherwise it is a [`CommandStatus`] response code. The second byte is the
//! field device status ([`DeviceStatus`]).
//!
//! Both flag sets are plain `u8` newtypes. Several bits can be set at once,
//! and each set bit is meaningful on its own.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Serialize, Serializer};

// =============================================================================
// CommErrorFlag / CommErrorFlags
// =============================================================================

/// A single communication fault bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommErrorFlag {
    /// Bit 0.
    Undefined,
    /// Bit 1.
    BufferOverflow,
    /// Bit 2.
    Reserved,
    /// Bit 3.
    LongitudinalParityError,
    /// Bit 4.
    FramingError,
    /// Bit 5.
    Overrun,
    /// Bit 6.
    VerticalParityError,
    /// Bit 7.
    CommunicationError,
}

impl CommErrorFlag {
    /// All flags in bit order.
    pub const ALL: [CommErrorFlag; 8] = [
        CommErrorFlag::Undefined,
        CommErrorFlag::BufferOverflow,
        CommErrorFlag::Reserved,
        CommErrorFlag::LongitudinalParityError,
        CommErrorFlag::FramingError,
        CommErrorFlag::Overrun,
        CommErrorFlag::VerticalParityError,
        CommErrorFlag::CommunicationError,
    ];

    /// Returns the bit position of this flag.
    #[inline]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Returns the label used for metrics and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            CommErrorFlag::Undefined => "undefined",
            CommErrorFlag::BufferOverflow => "buffer_overflow",
            CommErrorFlag::Reserved => "reserved",
            CommErrorFlag::LongitudinalParityError => "longitudinal_parity_error",
            CommErrorFlag::FramingError => "framing_error",
            CommErrorFlag::Overrun => "overrun",
            CommErrorFlag::VerticalParityError => "vertical_parity_error",
            CommErrorFlag::CommunicationError => "communication_error",
        }
    }
}

impl fmt::Display for CommErrorFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of simultaneous communication fault bits.
///
/// # Examples
///
/// ```
/// use hart_core::status::{CommErrorFlag, CommErrorFlags};
///
/// let flags = CommErrorFlags::FRAMING_ERROR | CommErrorFlags::OVERRUN;
/// let set: Vec<_> = flags.iter().collect();
/// assert_eq!(set, vec![CommErrorFlag::FramingError, CommErrorFlag::Overrun]);
/// assert_eq!(flags.to_string(), "framing_error|overrun");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CommErrorFlags(u8);

impl CommErrorFlags {
    /// No flags set.
    pub const EMPTY: Self = Self(0);
    /// Bit 0.
    pub const UNDEFINED: Self = Self(1 << 0);
    /// Bit 1.
    pub const BUFFER_OVERFLOW: Self = Self(1 << 1);
    /// Bit 2.
    pub const RESERVED: Self = Self(1 << 2);
    /// Bit 3.
    pub const LONGITUDINAL_PARITY_ERROR: Self = Self(1 << 3);
    /// Bit 4.
    pub const FRAMING_ERROR: Self = Self(1 << 4);
    /// Bit 5.
    pub const OVERRUN: Self = Self(1 << 5);
    /// Bit 6.
    pub const VERTICAL_PARITY_ERROR: Self = Self(1 << 6);
    /// Bit 7.
    pub const COMMUNICATION_ERROR: Self = Self(1 << 7);

    /// Creates a flag set from a raw byte.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if no flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if `flag` is set.
    #[inline]
    pub const fn is_set(self, flag: CommErrorFlag) -> bool {
        self.0 & (1 << flag.bit()) != 0
    }

    /// Number of set bits.
    #[inline]
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the set flags in bit order.
    pub fn iter(self) -> impl Iterator<Item = CommErrorFlag> {
        CommErrorFlag::ALL.into_iter().filter(move |flag| self.is_set(*flag))
    }
}

impl From<CommErrorFlag> for CommErrorFlags {
    fn from(flag: CommErrorFlag) -> Self {
        Self(1 << flag.bit())
    }
}

impl FromIterator<CommErrorFlag> for CommErrorFlags {
    fn from_iter<I: IntoIterator<Item = CommErrorFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |acc, flag| acc | flag.into())
    }
}

impl BitOr for CommErrorFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CommErrorFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CommErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter().map(CommErrorFlag::as_str).collect();
        f.write_str(&names.join("|"))
    }
}

// =============================================================================
// DeviceStatus
// =============================================================================

/// Field device status byte.
///
/// Overwritten on the device model by every reply that carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceStatus(u8);

impl DeviceStatus {
    /// No condition reported.
    pub const OK: Self = Self(0);
    /// Bit 0.
    pub const PRIMARY_VARIABLE_OUT_OF_LIMITS: Self = Self(1 << 0);
    /// Bit 1.
    pub const NON_PRIMARY_VARIABLE_OUT_OF_LIMITS: Self = Self(1 << 1);
    /// Bit 2.
    pub const LOOP_CURRENT_SATURATED: Self = Self(1 << 2);
    /// Bit 3.
    pub const LOOP_CURRENT_FIXED: Self = Self(1 << 3);
    /// Bit 4.
    pub const MORE_STATUS_AVAILABLE: Self = Self(1 << 4);
    /// Bit 5.
    pub const COLD_START: Self = Self(1 << 5);
    /// Bit 6.
    pub const CONFIGURATION_CHANGED: Self = Self(1 << 6);
    /// Bit 7.
    pub const DEVICE_MALFUNCTION: Self = Self(1 << 7);

    const NAMES: [&'static str; 8] = [
        "primary_variable_out_of_limits",
        "non_primary_variable_out_of_limits",
        "loop_current_saturated",
        "loop_current_fixed",
        "more_status_available",
        "cold_start",
        "configuration_changed",
        "device_malfunction",
    ];

    /// Creates a status from a raw byte.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if no condition is reported.
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the set conditions in bit order.
    pub fn names(self) -> Vec<&'static str> {
        (0..8)
            .filter(|bit| self.0 & (1 << bit) != 0)
            .map(|bit| Self::NAMES[bit as usize])
            .collect()
    }
}

impl BitOr for DeviceStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("ok");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// CommandStatus
// =============================================================================

/// Command response code of a reply without communication faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandStatus {
    /// 0
    #[default]
    Success,
    /// 2
    InvalidSelection,
    /// 3
    ParameterTooLarge,
    /// 4
    ParameterTooSmall,
    /// 5
    TooFewDataBytes,
    /// 6
    DeviceSpecificError,
    /// 7
    WriteProtected,
    /// 8, a warning when returned with data.
    UpdateFailure,
    /// 16
    AccessRestricted,
    /// 32
    Busy,
    /// 64
    NotImplemented,
    /// Any other code.
    Other(u8),
}

impl CommandStatus {
    /// Returns the raw response code.
    pub const fn code(self) -> u8 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::InvalidSelection => 2,
            CommandStatus::ParameterTooLarge => 3,
            CommandStatus::ParameterTooSmall => 4,
            CommandStatus::TooFewDataBytes => 5,
            CommandStatus::DeviceSpecificError => 6,
            CommandStatus::WriteProtected => 7,
            CommandStatus::UpdateFailure => 8,
            CommandStatus::AccessRestricted => 16,
            CommandStatus::Busy => 32,
            CommandStatus::NotImplemented => 64,
            CommandStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandStatus::Success => "success",
            CommandStatus::InvalidSelection => "invalid_selection",
            CommandStatus::ParameterTooLarge => "parameter_too_large",
            CommandStatus::ParameterTooSmall => "parameter_too_small",
            CommandStatus::TooFewDataBytes => "too_few_data_bytes",
            CommandStatus::DeviceSpecificError => "device_specific_error",
            CommandStatus::WriteProtected => "write_protected",
            CommandStatus::UpdateFailure => "update_failure",
            CommandStatus::AccessRestricted => "access_restricted",
            CommandStatus::Busy => "busy",
            CommandStatus::NotImplemented => "not_implemented",
            CommandStatus::Other(code) => return write!(f, "code_{}", code),
        };
        f.write_str(name)
    }
}

impl Serialize for CommandStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
