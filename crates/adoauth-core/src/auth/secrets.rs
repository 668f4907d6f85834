// SPDX-License-Identifier: Apache-2.0

//! Named secret lookup for personal access tokens.
//!
//! The PAT is resolved through a priority chain:
//! 1. `AZDO_PAT`
//! 2. `ADO_PAT`
//! 3. `AZURE_DEVOPS_EXT_PAT`
//!
//! Values are trimmed and whitespace-only values are skipped.

use secrecy::SecretString;
use tracing::{debug, instrument};

/// Names consulted for a personal access token, highest priority first.
pub const PAT_ENV_VARS: [&str; 3] = ["AZDO_PAT", "ADO_PAT", "AZURE_DEVOPS_EXT_PAT"];

/// Looks up named secrets.
///
/// Injected into token providers so the secret store can be swapped out,
/// for example with an in-memory map in tests.
pub trait SecretSource: Send + Sync {
    /// Returns the raw value stored under `name`, if any.
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Resolves a personal access token using the priority chain.
///
/// Returns the trimmed token and the name it was read from, or `None` if
/// every name is unset or whitespace-only.
#[instrument(skip(source))]
pub fn resolve_pat(source: &dyn SecretSource) -> Option<(SecretString, &'static str)> {
    for name in PAT_ENV_VARS {
        let Some(raw) = source.get(name) else {
            continue;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            debug!(source = name, "Ignoring blank PAT value");
            continue;
        }
        debug!(source = name, length = trimmed.len(), "Resolved PAT");
        return Some((SecretString::from(trimmed.to_owned()), name));
    }

    debug!("No PAT found in any source");
    None
}
