// SPDX-License-Identifier: Apache-2.0

//! adoauth - Azure DevOps tokens and Authorization headers.
//!
//! A CLI that resolves a token with the configured auth type and prints it,
//! or the `Authorization` header built from it, for use with other tools.

mod cli;
mod commands;
mod errors;
mod logging;

use adoauth_core::config;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = config::load_config().context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    match commands::run(cli.command, cli.output, &config.auth).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            std::process::exit(1);
        }
    }
}
