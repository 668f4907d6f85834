// SPDX-License-Identifier: Apache-2.0

//! Configuration management for adoauth.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `ADOAUTH_`)
//! 2. Config file: `~/.config/adoauth/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Use a personal access token and re-read it on every request
//! ADOAUTH_AUTH__AUTH_TYPE=pat ADOAUTH_AUTH__NO_CACHE=true adoauth header
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::auth::AuthMode;
use crate::error::AuthError;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Authentication settings.
    pub auth: AuthConfig,
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Auth mode: "interactive", "azcli", "env" or "pat".
    pub auth_type: AuthMode,
    /// Tenant to authenticate against.
    pub tenant: Option<String>,
    /// Re-derive the token on every request instead of reusing it.
    pub no_cache: bool,
}

/// Returns the adoauth configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/adoauth`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("adoauth");
    }
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("adoauth")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration from the default path.
///
/// Environment variables use the prefix `ADOAUTH_` and double underscore
/// for nested keys (e.g., `ADOAUTH_AUTH__TENANT`).
///
/// # Errors
///
/// Returns `AuthError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, AuthError> {
    load_config_from(&config_file_path())
}

/// Load application configuration from `path` plus the environment.
///
/// # Errors
///
/// Returns `AuthError::Config` if the file exists but is invalid.
pub fn load_config_from(path: &Path) -> Result<AppConfig, AuthError> {
    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::from(path).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("ADOAUTH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}
