// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! hart-exporter entry point.

use hart_bin::cli::Cli;
use hart_bin::error::report_error_and_exit;
use hart_bin::{commands, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    if let Err(error) = logging::init_logging(cli.effective_log_level(), cli.log_format) {
        report_error_and_exit(error);
    }

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
