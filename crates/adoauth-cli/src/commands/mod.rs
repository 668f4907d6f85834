// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the adoauth CLI.

pub mod auth;
pub mod completion;

use adoauth_core::AuthConfig;
use anyhow::Result;

use crate::cli::{Commands, CompletionCommand, OutputFormat};

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, output: OutputFormat, config: &AuthConfig) -> Result<()> {
    match command {
        Commands::Token(args) => auth::run_token(&args.merge(config), output).await,
        Commands::Header(args) => auth::run_header(&args.merge(config), output).await,
        Commands::Status(args) => {
            auth::run_status(&args.merge(config), output);
            Ok(())
        }
        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell)
        }
    }
}
