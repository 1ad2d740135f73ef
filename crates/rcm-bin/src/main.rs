// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RCM backend entry point.

use rcm_bin::error::report_error_and_exit;
use rcm_bin::{Cli, LogSettings, commands, init_logging};
use rcm_config::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // The file's logging section only applies when the file loads cleanly;
    // the run command reports load errors once logging is up.
    let file_logging = ConfigLoader::new()
        .load_or_defaults(&cli.config)
        .ok()
        .map(|config| config.logging);

    if let Err(e) = init_logging(&LogSettings::resolve(&cli, file_logging.as_ref())) {
        report_error_and_exit(e);
    }

    if let Err(e) = commands::execute(cli).await {
        tracing::error!(error = %e, "Command failed");
        report_error_and_exit(e);
    }
}
