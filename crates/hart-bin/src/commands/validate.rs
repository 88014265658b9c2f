// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use anyhow::Context;
use hart_config::{load_config, HartConfig};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Loads and validates the configuration file without opening the device.
///
/// Unlike `run`, a missing file is an error here.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    let config = load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;
    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!(
                "  Device:   {} ({})",
                config.device.port,
                config.device.engine.as_str()
            );
            println!("  Commands: {:?}", config.poller.commands);
            println!(
                "  Cadence:  {} every {} ms",
                config.poller.cadence_policy().as_str(),
                config.poller.interval_ms
            );
            println!("  Failures: {}", config.poller.failure_policy.as_str());
            if config.api.enabled {
                println!(
                    "  API:      {} (snapshot: {})",
                    config.api.socket_addr(),
                    config.api.snapshot.as_str()
                );
            } else {
                println!("  API:      disabled");
            }

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                let rendered = serde_json::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!();
                println!("Parsed configuration:");
                println!("{}", rendered);
            }
        }
        OutputFormat::Json => {
            let mut output = serde_json::Map::new();
            output.insert("valid".into(), true.into());
            output.insert("config_path".into(), config_path.display().to_string().into());
            output.insert("warnings".into(), warnings.into());
            if args.show_config {
                output.insert(
                    "config".into(),
                    serde_json::to_value(&config).context("Failed to serialize configuration")?,
                );
            }
            let rendered = serde_json::to_string_pretty(&output)
                .context("Failed to serialize validation result")?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// Settings that load fine but are probably not what the operator wants.
pub(crate) fn collect_warnings(config: &HartConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.device.simulator.fault_rate > 0.0 {
        warnings.push(format!(
            "Simulator fault injection is on ({:.0}% of commands fail)",
            config.device.simulator.fault_rate * 100.0
        ));
    }
    if config.device.simulator.fail_identification {
        warnings.push("Simulator is set to fail identification".to_string());
    }
    if !config.api.enabled {
        warnings.push("HTTP endpoint is disabled; nothing will be exported".to_string());
    }
    if config.poller.channel_capacity > 1 {
        warnings.push(format!(
            "Result channel holds {} entries; metrics may lag the device",
            config.poller.channel_capacity
        ));
    }

    warnings
}
