// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `AuthError` and adds hints for each error
//! kind. This keeps structured error data in the library and presentation
//! in the CLI.

use adoauth_core::auth::PAT_ENV_VARS;
use adoauth_core::error::AuthError;
use anyhow::Error;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not an `AuthError`, returns the original error message.
pub fn format_error(error: &Error) -> String {
    let Some(auth_err) = error.downcast_ref::<AuthError>() else {
        return format!("{error:#}");
    };

    match auth_err {
        AuthError::MissingPat => format!(
            "{auth_err}\n\nTip: Export a personal access token, e.g. `export {}=<token>`.",
            PAT_ENV_VARS[0]
        ),
        AuthError::Configuration { .. } => {
            format!("{auth_err}\n\nTip: Pass `--auth-type azcli`, `--auth-type env` or `--auth-type pat`.")
        }
        AuthError::TokenAcquisition { .. } => {
            format!("{auth_err}\n\nTip: Run `az login` and try again.")
        }
        AuthError::Backend(_) => {
            format!("{auth_err}\n\nTip: Re-run with -v for details.")
        }
        AuthError::Config(_) => format!(
            "{auth_err}\n\nTip: Check your config file at {}",
            adoauth_core::config_file_path().display()
        ),
    }
}
