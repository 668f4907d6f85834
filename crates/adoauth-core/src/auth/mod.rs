// SPDX-License-Identifier: Apache-2.0

//! Token providers for the Azure DevOps API.
//!
//! A [`TokenProvider`] is obtained once from a [`TokenProviderFactory`] and
//! asked for the current token before every outbound request. Which source
//! answers depends on the [`AuthMode`]:
//!
//! 1. `interactive` - browser-based OAuth login with silent reuse
//! 2. `azcli` - Azure CLI (developer tool) credential chain
//! 3. `env` - environment credential chain
//! 4. `pat` - personal access token from `AZDO_PAT`, `ADO_PAT` or `AZURE_DEVOPS_EXT_PAT`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub mod credential;
pub mod interactive;
pub mod provider;
pub mod secrets;

pub use credential::{
    AccessToken, AzureCliCredential, ChainedTokenCredential, CredentialChainFactory,
    DefaultCredentialChainFactory, EnvironmentCredential, TokenCredential,
};
pub use interactive::{
    AccountInfo, AuthenticationResult, BrowserLauncher, InteractiveRequest, OAuthAuthenticator,
    Prompt, PublicClient, PublicClientConfig, PublicClientFactory, SystemBrowser,
};
pub use provider::{TokenProvider, TokenProviderFactory};
pub use secrets::{EnvSecretSource, PAT_ENV_VARS, SecretSource};

/// Scope granting access to the Azure DevOps REST API.
pub const AZURE_DEVOPS_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798/.default";

/// Scopes requested from every token backend.
pub const SCOPES: &[&str] = &[AZURE_DEVOPS_SCOPE];

/// Public client ID registered for native Azure DevOps tooling.
pub const OAUTH_CLIENT_ID: &str = "0d50963b-7bb9-4fe7-94c7-a99af00b5136";

/// Authority used when no tenant is configured.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";

/// Sentinel prefix marking a token string as a personal access token.
pub const PAT_PREFIX: &str = "pat:";

/// Returns the login authority for an optional tenant.
#[must_use]
pub fn authority_for(tenant_id: Option<&str>) -> String {
    match tenant_id {
        Some(tenant) => format!("https://login.microsoftonline.com/{tenant}"),
        None => DEFAULT_AUTHORITY.to_string(),
    }
}

/// Selects which credential source backs a [`TokenProvider`].
///
/// Deserialization goes through [`FromStr`], so config files and
/// environment variables accept the same spellings as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AuthMode {
    /// Browser-based OAuth login.
    #[default]
    #[serde(rename = "interactive")]
    Interactive,
    /// Azure CLI credential chain.
    #[serde(rename = "azcli")]
    AzureCli,
    /// Environment credential chain.
    #[serde(rename = "env")]
    Environment,
    /// Personal access token.
    #[serde(rename = "pat")]
    PreSharedSecret,
}

impl AuthMode {
    /// All modes, in the order they are listed to users.
    pub const ALL: [AuthMode; 4] = [
        AuthMode::Interactive,
        AuthMode::AzureCli,
        AuthMode::Environment,
        AuthMode::PreSharedSecret,
    ];

    /// The selector string for this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Interactive => "interactive",
            AuthMode::AzureCli => "azcli",
            AuthMode::Environment => "env",
            AuthMode::PreSharedSecret => "pat",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        AuthMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                AuthError::configuration(format!(
                    "Unknown auth type '{s}'. Expected one of: interactive, azcli, env, pat"
                ))
            })
    }
}

impl TryFrom<String> for AuthMode {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
