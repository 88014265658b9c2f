// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: start polling and serving (default)
//! - `validate`: validate the configuration file
//! - `version`: show version information

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hart_config::{CadenceKind, HartConfig};
use hart_core::{FailurePolicy, SnapshotShape};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// HART field device poller with a Prometheus exposition endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "hart-exporter",
    author = "Sylvex <contact@sylvex.io>",
    version = hart_core::VERSION,
    about = "Polls a HART field device and exposes its values to Prometheus",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path. A missing file means built-in defaults.
    #[arg(
        short,
        long,
        default_value = "hart.yaml",
        env = "HART_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "HART_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "HART_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Poll the device and serve metrics
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without opening the device.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command. Each one overrides the file.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Serial port of the HART modem
    #[arg(long)]
    pub serial: Option<String>,

    /// HTTP listen address (0.0.0.0:3333) or bare port (3333)
    #[arg(long, value_parser = parse_listen)]
    pub listen: Option<ListenArg>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// How the poll interval is applied
    #[arg(long)]
    pub cadence: Option<CadenceArg>,

    /// Reaction to a failed command
    #[arg(long)]
    pub failure_policy: Option<FailurePolicyArg>,

    /// Shape of the /hart document
    #[arg(long)]
    pub snapshot: Option<SnapshotArg>,

    /// Exit when the device cannot be identified
    #[arg(long)]
    pub exit_on_identification_failure: bool,
}

impl RunArgs {
    /// Applies the command-line overrides to a loaded configuration.
    pub fn apply(&self, config: &mut HartConfig) {
        if let Some(serial) = &self.serial {
            config.device.port = serial.clone();
        }
        match self.listen {
            Some(ListenArg::Addr(listen)) => {
                config.api.bind_address = listen.ip();
                config.api.port = listen.port();
            }
            Some(ListenArg::Port(port)) => config.api.port = port,
            None => {}
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poller.interval_ms = interval_ms;
        }
        if let Some(cadence) = self.cadence {
            config.poller.cadence = cadence.into();
        }
        if let Some(policy) = self.failure_policy {
            config.poller.failure_policy = policy.into();
        }
        if let Some(snapshot) = self.snapshot {
            config.api.snapshot = snapshot.into();
        }
        if self.exit_on_identification_failure {
            config.poller.exit_on_identification_failure = true;
        }
    }
}

/// `--listen` value. A bare port keeps the configured bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenArg {
    /// Full socket address.
    Addr(SocketAddr),
    /// Port only.
    Port(u16),
}

fn parse_listen(value: &str) -> Result<ListenArg, String> {
    let port = value.strip_prefix(':').unwrap_or(value);
    if let Ok(port) = port.parse::<u16>() {
        return Ok(ListenArg::Port(port));
    }
    value
        .parse::<SocketAddr>()
        .map(ListenArg::Addr)
        .map_err(|_| format!("'{value}' is neither a port nor a socket address"))
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// `--cadence` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CadenceArg {
    /// Sleep what is left of the interval after each cycle
    CycleBudget,
    /// Sleep the full interval after each command
    FixedDelay,
}

impl From<CadenceArg> for CadenceKind {
    fn from(value: CadenceArg) -> Self {
        match value {
            CadenceArg::CycleBudget => CadenceKind::CycleBudget,
            CadenceArg::FixedDelay => CadenceKind::FixedDelay,
        }
    }
}

/// `--failure-policy` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicyArg {
    /// Count the failure and keep polling
    FailSoft,
    /// Count the failure and stop
    FailFast,
}

impl From<FailurePolicyArg> for FailurePolicy {
    fn from(value: FailurePolicyArg) -> Self {
        match value {
            FailurePolicyArg::FailSoft => FailurePolicy::FailSoft,
            FailurePolicyArg::FailFast => FailurePolicy::FailFast,
        }
    }
}

/// `--snapshot` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SnapshotArg {
    /// The device object alone
    Device,
    /// Device and command records
    Full,
}

impl From<SnapshotArg> for SnapshotShape {
    fn from(value: SnapshotArg) -> Self {
        match value {
            SnapshotArg::Device => SnapshotShape::Device,
            SnapshotArg::Full => SnapshotShape::Full,
        }
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["hart-exporter"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
        assert_eq!(cli.config, PathBuf::from("hart.yaml"));
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from([
            "hart-exporter",
            "run",
            "--serial",
            "/dev/ttyS1",
            "--listen",
            "127.0.0.1:9100",
            "--interval-ms",
            "500",
            "--cadence",
            "fixed-delay",
            "--failure-policy",
            "fail-fast",
            "--snapshot",
            "device",
        ]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("Expected Run command");
        };

        let mut config = HartConfig::default();
        args.apply(&mut config);
        assert_eq!(config.device.port, "/dev/ttyS1");
        assert_eq!(config.api.socket_addr().to_string(), "127.0.0.1:9100");
        assert_eq!(config.poller.interval_ms, 500);
        assert_eq!(config.poller.cadence, CadenceKind::FixedDelay);
        assert_eq!(config.poller.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.api.snapshot, SnapshotShape::Device);
        assert!(!config.poller.exit_on_identification_failure);
    }

    #[test]
    fn test_listen_accepts_bare_port() {
        let cli = Cli::parse_from(["hart-exporter", "run", "--listen", "9200"]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.listen, Some(ListenArg::Port(9200)));

        let mut config = HartConfig::default();
        config.api.bind_address = "127.0.0.1".parse().unwrap();
        args.apply(&mut config);
        assert_eq!(config.api.socket_addr().to_string(), "127.0.0.1:9200");

        assert_eq!(parse_listen(":3333"), Ok(ListenArg::Port(3333)));
        assert!(parse_listen("localhost").is_err());
        assert!(Cli::try_parse_from(["hart-exporter", "run", "--listen", "70000"]).is_err());
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let mut config = HartConfig::default();
        config.poller.interval_ms = 750;
        RunArgs::default().apply(&mut config);
        assert_eq!(config.poller.interval_ms, 750);
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["hart-exporter", "validate", "--show-config", "-f", "json"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_quiet_and_verbose() {
        let cli = Cli::parse_from(["hart-exporter", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["hart-exporter", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");

        let cli = Cli::parse_from(["hart-exporter", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(), "trace");
    }
}
