// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for the HART exporter.
//!
//! # Schema Structure
//!
//! ```text
//! HartConfig
//! ├── device: DeviceConfig
//! │   └── simulator: SimulatorConfig
//! ├── poller: PollerConfig
//! ├── api: ApiConfig
//! └── metrics: MetricsConfig
//! ```
//!
//! Every section is optional; an empty document yields the defaults.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use hart_core::{
    CadencePolicy, CommandCatalog, CommandKind, DeviceIdentity, FailurePolicy, SchedulerConfig,
    SimulatorOptions, SnapshotShape,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default serial port.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Maximum poll interval in milliseconds (1 hour).
pub const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// Default result channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Default steady-state command numbers.
pub const DEFAULT_COMMANDS: [u8; 5] = [1, 2, 3, 13, 15];

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 3333;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HartConfig {
    /// Field device connection.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Polling behaviour.
    #[serde(default)]
    pub poller: PollerConfig,

    /// HTTP exposition endpoint.
    #[serde(default)]
    pub api: ApiConfig,

    /// Prometheus registry.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl HartConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.device.validate()?;
        self.poller.validate()?;
        self.api.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Which protocol engine drives the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// In-process simulated transmitter.
    #[default]
    Simulated,
}

impl EngineKind {
    /// Returns the engine name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Simulated => "simulated",
        }
    }
}

/// Field device connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Serial port (channel) the engine opens.
    #[serde(default = "default_serial_port")]
    pub port: String,

    /// Protocol engine.
    #[serde(default)]
    pub engine: EngineKind,

    /// Simulator settings, used when `engine` is `simulated`.
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

fn default_serial_port() -> String {
    DEFAULT_SERIAL_PORT.to_string()
}

impl DeviceConfig {
    /// Validates the device configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::validation("device.port", "cannot be empty"));
        }
        self.simulator.validate()
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            engine: EngineKind::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

/// Simulated transmitter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Tag reported by command 13.
    #[serde(default = "default_tag")]
    pub tag: String,

    /// Device id reported by command 0.
    #[serde(default = "default_device_id")]
    pub device_id: u32,

    /// Probability that a steady-state command fails.
    #[serde(default)]
    pub fault_rate: f64,

    /// Fail identification.
    #[serde(default)]
    pub fail_identification: bool,

    /// RNG seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Reply latency in milliseconds.
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_tag() -> String {
    "TT-101".to_string()
}

fn default_device_id() -> u32 {
    1_234_567
}

impl SimulatorConfig {
    /// Validates the simulator configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.fault_rate) {
            return Err(ConfigError::out_of_range(
                "device.simulator.fault_rate",
                self.fault_rate,
                0.0,
                1.0,
            ));
        }
        // Device ids are 24 bits on the wire.
        if self.device_id > 0x00FF_FFFF {
            return Err(ConfigError::out_of_range(
                "device.simulator.device_id",
                self.device_id,
                0,
                0x00FF_FFFF,
            ));
        }
        Ok(())
    }

    /// Converts to simulator options.
    pub fn options(&self) -> SimulatorOptions {
        let defaults = SimulatorOptions::default();
        SimulatorOptions {
            identity: DeviceIdentity {
                device_id: self.device_id,
                ..defaults.identity
            },
            tag: self.tag.clone(),
            fail_identification: self.fail_identification,
            fault_rate: self.fault_rate,
            seed: self.seed,
            latency: Duration::from_millis(self.latency_ms),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tag: default_tag(),
            device_id: default_device_id(),
            fault_rate: 0.0,
            fail_identification: false,
            seed: None,
            latency_ms: 0,
        }
    }
}

// =============================================================================
// Poller Configuration
// =============================================================================

/// How `interval_ms` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceKind {
    /// Sleep what is left of the interval after each cycle.
    #[default]
    CycleBudget,
    /// Sleep the full interval after each command.
    FixedDelay,
}

/// Polling behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Cadence policy.
    #[serde(default)]
    pub cadence: CadenceKind,

    /// Poll interval in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Reaction to a failed steady-state command.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Result channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Exit the process when identification fails instead of serving
    /// the last (empty) snapshot.
    #[serde(default)]
    pub exit_on_identification_failure: bool,

    /// Steady-state command numbers, in polling order.
    #[serde(default = "default_commands")]
    pub commands: Vec<u8>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_commands() -> Vec<u8> {
    DEFAULT_COMMANDS.to_vec()
}

impl PollerConfig {
    /// Validates the poller configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_ms == 0 {
            return Err(ConfigError::validation("poller.interval_ms", "cannot be zero"));
        }
        if self.interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::out_of_range(
                "poller.interval_ms",
                self.interval_ms,
                1,
                MAX_POLL_INTERVAL_MS,
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::validation(
                "poller.channel_capacity",
                "cannot be zero",
            ));
        }
        if self.commands.is_empty() {
            return Err(ConfigError::validation("poller.commands", "cannot be empty"));
        }

        let mut seen = HashSet::new();
        for &number in &self.commands {
            let kind = CommandKind::from_number(number);
            if !kind.is_supported() {
                return Err(ConfigError::unknown_command(number));
            }
            if kind == CommandKind::ReadUniqueIdentifier {
                return Err(ConfigError::validation(
                    "poller.commands",
                    "command 0 runs once at startup and cannot be polled",
                ));
            }
            if !seen.insert(number) {
                return Err(ConfigError::validation(
                    "poller.commands",
                    format!("command {} listed twice", number),
                ));
            }
        }
        Ok(())
    }

    /// Returns the poll interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the cadence policy carrying the interval.
    pub fn cadence_policy(&self) -> CadencePolicy {
        match self.cadence {
            CadenceKind::CycleBudget => CadencePolicy::CycleBudget(self.interval()),
            CadenceKind::FixedDelay => CadencePolicy::FixedDelay(self.interval()),
        }
    }

    /// Returns the scheduler configuration.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            cadence: self.cadence_policy(),
            failure_policy: self.failure_policy,
        }
    }

    /// Returns the command catalog.
    pub fn catalog(&self) -> CommandCatalog {
        CommandCatalog::from_numbers(&self.commands)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            cadence: CadenceKind::default(),
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            failure_policy: FailurePolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            exit_on_identification_failure: false,
            commands: default_commands(),
        }
    }
}

// =============================================================================
// API Configuration
// =============================================================================

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Whether the endpoint is served.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Shape of the `/hart` document.
    #[serde(default)]
    pub snapshot: SnapshotShape,
}

fn default_enabled() -> bool {
    true
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

impl ApiConfig {
    /// Validates the API configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("api.port", "cannot be zero"));
        }
        Ok(())
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            port: DEFAULT_API_PORT,
            snapshot: SnapshotShape::default(),
        }
    }
}

// =============================================================================
// Metrics Configuration
// =============================================================================

/// Prometheus registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Prefix prepended to every metric name. Empty means none.
    #[serde(default)]
    pub namespace: String,
}

impl MetricsConfig {
    /// Validates the namespace against the Prometheus name grammar.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut chars = self.namespace.chars();
        let valid = match chars.next() {
            None => true,
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_' || first == ':')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
            }
        };
        if !valid {
            return Err(ConfigError::validation(
                "metrics.namespace",
                format!("'{}' is not a valid metric name prefix", self.namespace),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
