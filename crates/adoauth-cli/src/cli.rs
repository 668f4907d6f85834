// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for adoauth.
//!
//! Uses clap's derive API for declarative CLI parsing.

use adoauth_core::{AuthConfig, AuthMode};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(adoauth completion generate bash)"

  zsh
    Generate completion file:
      mkdir -p ~/.zsh/completions
      adoauth completion generate zsh > ~/.zsh/completions/_adoauth

  fish
    Generate completion file:
      adoauth completion generate fish > ~/.config/fish/completions/adoauth.fish
"#;

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
}

/// adoauth - Azure DevOps tokens and Authorization headers.
///
/// Obtains a token using interactive, Azure CLI, environment or PAT
/// authentication and prints it, or the `Authorization` header built from it.
#[derive(Parser)]
#[command(name = "adoauth")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Auth settings that override the configuration file.
#[derive(Args, Clone, Default)]
pub struct AuthArgs {
    /// Authentication type: interactive, azcli, env or pat
    #[arg(long, short = 'a')]
    pub auth_type: Option<AuthMode>,

    /// Tenant ID to authenticate against
    #[arg(long, short = 't')]
    pub tenant: Option<String>,

    /// Re-derive the token on every request instead of reusing it
    #[arg(long, overrides_with = "cache")]
    pub no_cache: bool,

    /// Reuse the token across requests, even if the config sets `no_cache`
    #[arg(long, overrides_with = "no_cache")]
    pub cache: bool,
}

impl AuthArgs {
    /// The cache setting given on the command line, if any.
    fn no_cache_flag(&self) -> Option<bool> {
        if self.no_cache {
            Some(true)
        } else if self.cache {
            Some(false)
        } else {
            None
        }
    }

    /// Applies these flags on top of `config`.
    #[must_use]
    pub fn merge(&self, config: &AuthConfig) -> AuthConfig {
        AuthConfig {
            auth_type: self.auth_type.unwrap_or(config.auth_type),
            tenant: self.tenant.clone().or_else(|| config.tenant.clone()),
            no_cache: self.no_cache_flag().unwrap_or(config.no_cache),
        }
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print a token for the selected auth type
    Token(AuthArgs),

    /// Print the Authorization header value for the selected auth type
    Header(AuthArgs),

    /// Show the effective auth settings without requesting a token
    Status(AuthArgs),

    /// Generate shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Generate completion script for a shell (output to stdout)
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
