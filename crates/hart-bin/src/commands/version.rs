// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints version information for every crate in the exporter.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("hart-exporter - HART field device poller and Prometheus exporter");
    println!();
    println!("Version Information:");
    println!("  hart-bin:    {}", crate::VERSION);
    println!("  hart-core:   {}", hart_core::VERSION);
    println!("  hart-api:    {}", hart_api::VERSION);
    println!("  hart-config: {}", hart_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:      {}", std::env::consts::ARCH);
    println!("  OS:          {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
