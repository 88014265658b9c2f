// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HART engineering unit codes.

use std::fmt;

use serde::{Serialize, Serializer};

/// A HART engineering unit code.
///
/// Renders as a short symbol (`degC`, `kPa`, `mA`, ...). Codes outside the
/// table render as `unit_<n>`.
///
/// # Examples
///
/// ```
/// use hart_core::units::UnitCode;
///
/// assert_eq!(UnitCode::DEG_C.to_string(), "degC");
/// assert_eq!(UnitCode::new(201).to_string(), "unit_201");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UnitCode(u8);

impl UnitCode {
    /// Degrees Celsius.
    pub const DEG_C: Self = Self(32);
    /// Kilopascal.
    pub const KPA: Self = Self(12);
    /// Milliampere.
    pub const MILLIAMPERE: Self = Self(39);
    /// Percent.
    pub const PERCENT: Self = Self(57);
    /// Seconds.
    pub const SECONDS: Self = Self(51);
    /// Bar.
    pub const BAR: Self = Self(7);

    /// Creates a unit from its code.
    #[inline]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns the symbol if the code is known.
    pub const fn symbol(self) -> Option<&'static str> {
        let symbol = match self.0 {
            1 => "inH2O",
            2 => "inHg",
            3 => "ftH2O",
            4 => "mmH2O",
            5 => "mmHg",
            6 => "psi",
            7 => "bar",
            8 => "mbar",
            9 => "g/cm2",
            10 => "kg/cm2",
            11 => "Pa",
            12 => "kPa",
            13 => "torr",
            14 => "atm",
            15 => "ft3/min",
            16 => "gal/min",
            17 => "l/min",
            19 => "m3/h",
            20 => "ft/s",
            21 => "m/s",
            32 => "degC",
            33 => "degF",
            34 => "degR",
            35 => "K",
            36 => "mV",
            37 => "Ohm",
            38 => "Hz",
            39 => "mA",
            40 => "gal",
            41 => "l",
            43 => "m3",
            44 => "ft",
            45 => "m",
            47 => "in",
            49 => "mm",
            50 => "min",
            51 => "s",
            52 => "h",
            53 => "d",
            57 => "percent",
            58 => "V",
            59 => "pH",
            60 => "g",
            61 => "kg",
            63 => "lb",
            70 => "g/s",
            73 => "kg/s",
            75 => "kg/h",
            237 => "MPa",
            250 => "not_used",
            251 => "none",
            _ => return None,
        };
        Some(symbol)
    }
}

impl From<u8> for UnitCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => f.write_str(symbol),
            None => write!(f, "unit_{}", self.0),
        }
    }
}

impl Serialize for UnitCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
