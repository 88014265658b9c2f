// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use hart_config::{ConfigLoader, HartConfig};
use tracing::info;

use crate::cli::{Cli, RunArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let config = resolve_config(cli, &args)?;
    info!(
        config = %cli.config.display(),
        port = %config.device.port,
        engine = config.device.engine.as_str(),
        "Configuration loaded"
    );

    RuntimeBuilder::new().config(config).build()?.run().await
}

/// File (or defaults), then environment, then command-line overrides.
pub(crate) fn resolve_config(cli: &Cli, args: &RunArgs) -> BinResult<HartConfig> {
    let mut config = ConfigLoader::new()
        .load_or_default(&cli.config)
        .map_err(|e| {
            BinError::from(e).with_context(format!("Failed to load {}", cli.config.display()))
        })?;

    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| BinError::from(e).with_context("Invalid command-line override"))?;
    Ok(config)
}
