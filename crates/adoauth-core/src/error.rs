// SPDX-License-Identifier: Apache-2.0

//! Error types for adoauth.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use thiserror::Error;

use crate::auth::PAT_ENV_VARS;

/// Errors that can occur while producing credentials.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable configuration for the selected auth mode (e.g. no PAT set).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The `pat` mode found no usable personal access token.
    #[error(
        "Configuration error: PAT authentication selected but no PAT found. Set {primary} (preferred) or {secondary} / {tertiary} environment variable.",
        primary = PAT_ENV_VARS[0],
        secondary = PAT_ENV_VARS[1],
        tertiary = PAT_ENV_VARS[2]
    )]
    MissingPat,

    /// A credential backend completed without producing a usable token.
    #[error("Token acquisition failed: {message}")]
    TokenAcquisition {
        /// Error message.
        message: String,
    },

    /// Failure raised by a credential backend, passed through unmodified.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    /// Configuration file error.
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AuthError {
    /// Returns true for errors caused by missing or invalid settings.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuthError::Configuration { .. } | AuthError::MissingPat | AuthError::Config(_)
        )
    }

    /// Builds a [`AuthError::Configuration`] from any message.
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        AuthError::Configuration {
            message: message.into(),
        }
    }

    /// Builds a [`AuthError::TokenAcquisition`] from any message.
    pub(crate) fn token_acquisition(message: impl Into<String>) -> Self {
        AuthError::TokenAcquisition {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_is_transparent() {
        let err = AuthError::from(anyhow::anyhow!("az: command not found"));
        assert_eq!(err.to_string(), "az: command not found");
    }

    #[test]
    fn test_missing_pat_message_names_every_variable() {
        let err = AuthError::MissingPat;
        let message = err.to_string();

        assert!(message.contains("no PAT found"));
        assert!(message.contains("AZDO_PAT (preferred)"));
        assert!(message.contains("ADO_PAT / AZURE_DEVOPS_EXT_PAT"));
        assert!(err.is_configuration());
        assert!(!AuthError::token_acquisition("empty").is_configuration());
    }

    #[test]
    fn test_configuration_error_message() {
        let err = AuthError::configuration("no PAT found");
        assert_eq!(err.to_string(), "Configuration error: no PAT found");
    }
}
